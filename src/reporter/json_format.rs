use super::*;

impl<'a, T: TableRow> TableReporter<'a, T> {
    pub fn json_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self.rows)?;
        writeln!(writer)?;
        Ok(())
    }

    pub fn jsonl_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        for row in self.rows {
            serde_json::to_writer(&mut writer, row)?;
            writeln!(writer)?;
        }
        Ok(())
    }
}
