use super::*;
use crate::util::display_width;

#[derive(Clone, Copy)]
enum RowKind {
    Heading,
    Plain,
    Flagged,
}

impl<'a, T: TableRow> TableReporter<'a, T> {
    /// Bordered table followed by a total count line. Multi-line cells grow the row.
    pub fn pretty_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let heading: Vec<String> = T::COLUMNS.iter().map(|c| c.to_string()).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.cells().iter().map(ToString::to_string).collect())
            .collect();
        let widths = column_widths(&heading, &body);

        let separator = horizontal_rule(&widths, '-');
        writeln!(writer, "{}", self.styles.border(&separator))?;
        self.write_row(&mut writer, &heading, &widths, RowKind::Heading)?;
        writeln!(writer, "{}", self.styles.border(horizontal_rule(&widths, '=')))?;
        for (row, cells) in self.rows.iter().zip(&body) {
            let kind = if row.flagged() { RowKind::Flagged } else { RowKind::Plain };
            self.write_row(&mut writer, cells, &widths, kind)?;
            writeln!(writer, "{}", self.styles.border(&separator))?;
        }
        writeln!(writer, "{}", self.styles.summary(format!("Total users: {}", self.rows.len())))?;
        Ok(())
    }

    fn write_row<W: std::io::Write>(
        &self,
        writer: &mut W,
        cells: &[String],
        widths: &[usize],
        kind: RowKind,
    ) -> Result<()> {
        let lines: Vec<Vec<&str>> = cells.iter().map(|cell| cell.lines().collect()).collect();
        let height = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let bar = self.styles.border("|");

        for line_idx in 0..height {
            write!(writer, "{bar}")?;
            for (cell_lines, width) in lines.iter().zip(widths) {
                let text = cell_lines.get(line_idx).copied().unwrap_or("");
                let fill = width.saturating_sub(display_width(text));
                let padded = format!(" {text}{} ", " ".repeat(fill));
                match kind {
                    RowKind::Heading => write!(writer, "{}", self.styles.heading(padded))?,
                    RowKind::Flagged => write!(writer, "{}", self.styles.flagged(padded))?,
                    RowKind::Plain => write!(writer, "{padded}")?,
                }
                write!(writer, "{bar}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

fn column_widths(heading: &[String], body: &[Vec<String>]) -> Vec<usize> {
    heading
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            body.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| display_width(cell))
                .chain(std::iter::once(display_width(title)))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn horizontal_rule(widths: &[usize], fill: char) -> String {
    let mut rule = String::from("+");
    for width in widths {
        rule.extend(std::iter::repeat(fill).take(width + 2));
        rule.push('+');
    }
    rule
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::classifier::{AccessType, LastActivity, PermissionFact, Permissions, UserType};

    fn render<T: TableRow>(rows: &[T]) -> String {
        let reporter = TableReporter::new(rows, false);
        let mut buf = Vec::new();
        reporter.pretty_format(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn pretty_format_aligns_wide_characters() {
        let rows = vec![ReportRecord {
            name: "監査".into(),
            user_type: UserType::Local,
            access_type: AccessType::None,
            permissions: Permissions::None,
            last_activity_days: LastActivity::Never,
            eligible_for_removal: true,
        }];

        let rendered = render(&rows);
        let widths: Vec<usize> = rendered
            .lines()
            .filter(|line| line.starts_with('|') || line.starts_with('+'))
            .map(display_width)
            .collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]), "{rendered}");
        assert!(rendered.contains("| 監査 |"), "{rendered}");
    }

    #[test]
    fn horizontal_rule_spans_padded_columns() {
        assert_eq!(horizontal_rule(&[1, 3], '-'), "+---+-----+");
    }

    #[test]
    fn pretty_format_renders_report_table() {
        let rows = vec![
            ReportRecord {
                name: "alice".into(),
                user_type: UserType::Local,
                access_type: AccessType::Both,
                permissions: Permissions::from_facts(vec![
                    PermissionFact::managed("ReadOnlyAccess"),
                    PermissionFact::group("admins"),
                ]),
                last_activity_days: LastActivity::DaysAgo(7),
                eligible_for_removal: false,
            },
            ReportRecord {
                name: "ghost".into(),
                user_type: UserType::Service,
                access_type: AccessType::None,
                permissions: Permissions::None,
                last_activity_days: LastActivity::Never,
                eligible_for_removal: true,
            },
        ];

        let expected = "\
+-------+----------+------------+-----------------------------------+------------------+--------------------+
| Name  | UserType | AccessType | Permissions                       | LastActivityDays | EligibleForRemoval |
+=======+==========+============+===================================+==================+====================+
| alice | Local    | Both       | 1. Managed Policy: ReadOnlyAccess | 7                | False              |
|       |          |            | 2. Group: admins                  |                  |                    |
+-------+----------+------------+-----------------------------------+------------------+--------------------+
| ghost | Service  | None       | None                              | Never            | True               |
+-------+----------+------------+-----------------------------------+------------------+--------------------+
Total users: 2
";
        assert_eq!(render(&rows), expected);
    }

    #[test]
    fn pretty_format_of_empty_report_still_prints_total() {
        let rows: Vec<ReportRecord> = Vec::new();
        let output = render(&rows);
        assert!(output.contains("| Name | UserType |"));
        assert!(output.ends_with("Total users: 0\n"));
    }

    #[test]
    fn pretty_format_renders_principal_listing() {
        let rows = vec![Principal {
            name: "alice".into(),
            user_id: "AIDAALICE".into(),
            arn: "arn:aws:iam::123456789012:user/alice".into(),
            path: "/".into(),
            create_date: Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
            password_last_used: None,
        }];
        let output = render(&rows);
        assert!(output.contains("| CreateDate              | PasswordLastUsed |"));
        assert!(output.contains("| 2021-03-04 05:06:07 UTC | Never            |"));
        assert!(output.ends_with("Total users: 1\n"));
    }
}
