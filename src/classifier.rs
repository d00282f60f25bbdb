use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{ser::SerializeSeq, Serialize, Serializer};
use strum::Display;

/// Users with no console or key activity for at least this many days are
/// flagged as removal candidates.
pub const DEFAULT_INACTIVITY_DAYS: i64 = 90;

/// An IAM user as returned by the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub name: String,
    pub user_id: String,
    pub arn: String,
    pub path: String,
    pub create_date: DateTime<Utc>,
    pub password_last_used: Option<DateTime<Utc>>,
}

/// An access key and the last time it was used, if ever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyFact {
    pub access_key_id: String,
    pub last_used: Option<DateTime<Utc>>,
}

/// Whether the user has a console password.
///
/// `Absent` is only produced from an explicit "no such entity" response, so
/// it can be told apart from a lookup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginProfile {
    Present,
    Absent,
}

impl LoginProfile {
    pub fn exists(self) -> bool {
        matches!(self, LoginProfile::Present)
    }
}

/// Where a permission grant comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    ManagedPolicy,
    InlinePolicy,
    Group,
    GroupPolicy { group: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionFact {
    pub provenance: Provenance,
    pub name: String,
}

impl PermissionFact {
    pub fn managed(name: impl Into<String>) -> Self {
        Self { provenance: Provenance::ManagedPolicy, name: name.into() }
    }

    pub fn inline(name: impl Into<String>) -> Self {
        Self { provenance: Provenance::InlinePolicy, name: name.into() }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self { provenance: Provenance::Group, name: name.into() }
    }

    pub fn group_policy(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self { provenance: Provenance::GroupPolicy { group: group.into() }, name: name.into() }
    }
}

impl Display for PermissionFact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.provenance {
            Provenance::ManagedPolicy => write!(f, "Managed Policy: {}", self.name),
            Provenance::InlinePolicy => write!(f, "Inline Policy: {}", self.name),
            Provenance::Group => write!(f, "Group: {}", self.name),
            Provenance::GroupPolicy { group } => {
                write!(f, "Group Policy: {} (via {group})", self.name)
            }
        }
    }
}

/// Policies attached to one group the user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFacts {
    pub name: String,
    pub attached_policies: Vec<String>,
}

/// The raw policy lookups for one user, in the order they were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFacts {
    pub managed: Vec<String>,
    pub inline: Vec<String>,
    pub groups: Vec<GroupFacts>,
}

impl PolicyFacts {
    /// Flattens the lookups: managed policies, inline policies, then each group
    /// immediately followed by the policies attached to it.
    pub fn permission_facts(&self) -> Vec<PermissionFact> {
        let mut facts = Vec::with_capacity(
            self.managed.len()
                + self.inline.len()
                + self.groups.iter().map(|g| 1 + g.attached_policies.len()).sum::<usize>(),
        );
        facts.extend(self.managed.iter().map(PermissionFact::managed));
        facts.extend(self.inline.iter().map(PermissionFact::inline));
        for group in &self.groups {
            facts.push(PermissionFact::group(&group.name));
            facts.extend(
                group
                    .attached_policies
                    .iter()
                    .map(|policy| PermissionFact::group_policy(&group.name, policy)),
            );
        }
        facts
    }
}

/// Everything looked up about a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalFacts {
    pub principal: Principal,
    pub login_profile: LoginProfile,
    pub access_keys: Vec<AccessKeyFact>,
    pub policies: PolicyFacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum UserType {
    Service,
    Local,
}

impl UserType {
    pub fn from_path(path: &str) -> Self {
        if path.trim_matches('/') == "service" {
            UserType::Service
        } else {
            UserType::Local
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum AccessType {
    None,
    Console,
    #[strum(serialize = "CLI")]
    #[serde(rename = "CLI")]
    Cli,
    Both,
}

impl AccessType {
    pub fn from_credentials(login_profile: LoginProfile, has_access_keys: bool) -> Self {
        let access = if login_profile.exists() { AccessType::Console } else { AccessType::None };
        match (access, has_access_keys) {
            (AccessType::Console, true) => AccessType::Both,
            (AccessType::None, true) => AccessType::Cli,
            (access, _) => access,
        }
    }
}

/// The permission column: either nothing at all or a non-empty ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    None,
    Granted(Vec<PermissionFact>),
}

impl Permissions {
    pub fn from_facts(facts: Vec<PermissionFact>) -> Self {
        if facts.is_empty() {
            Permissions::None
        } else {
            Permissions::Granted(facts)
        }
    }

    pub fn facts(&self) -> &[PermissionFact] {
        match self {
            Permissions::None => &[],
            Permissions::Granted(facts) => facts,
        }
    }
}

/// Renders "None" or a numbered list, one entry per line.
impl Display for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Permissions::None => f.write_str("None"),
            Permissions::Granted(facts) => {
                for (idx, fact) in facts.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}. {fact}", idx + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Permissions::None => serializer.serialize_str("None"),
            Permissions::Granted(facts) => {
                let mut seq = serializer.serialize_seq(Some(facts.len()))?;
                for fact in facts {
                    seq.serialize_element(&fact.to_string())?;
                }
                seq.end()
            }
        }
    }
}

/// Most recent password or access key use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastActivity {
    Never,
    /// Used within the last 24 hours.
    Recently,
    DaysAgo(u64),
}

impl LastActivity {
    pub fn days(self) -> Option<u64> {
        match self {
            LastActivity::Never => None,
            LastActivity::Recently => Some(0),
            LastActivity::DaysAgo(days) => Some(days),
        }
    }
}

impl Display for LastActivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LastActivity::Never => f.write_str("Never"),
            LastActivity::Recently => f.write_str("Recently"),
            LastActivity::DaysAgo(days) => write!(f, "{days}"),
        }
    }
}

impl Serialize for LastActivity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LastActivity::DaysAgo(days) => serializer.serialize_u64(*days),
            other => serializer.collect_str(other),
        }
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportRecord {
    pub name: String,
    pub user_type: UserType,
    pub access_type: AccessType,
    pub permissions: Permissions,
    pub last_activity_days: LastActivity,
    pub eligible_for_removal: bool,
}

/// Classifies users relative to a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    now: DateTime<Utc>,
    inactivity_days: i64,
}

impl Classifier {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, inactivity_days: DEFAULT_INACTIVITY_DAYS }
    }

    pub fn inactivity_days(mut self, days: i64) -> Self {
        self.inactivity_days = days;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn threshold_days(&self) -> i64 {
        self.inactivity_days
    }

    /// Whole days elapsed since `timestamp`. Timestamps ahead of `now` count as 0.
    pub fn days_since(&self, timestamp: DateTime<Utc>) -> i64 {
        (self.now - timestamp).num_days().max(0)
    }

    pub fn last_activity(&self, facts: &PrincipalFacts) -> LastActivity {
        let latest = facts
            .principal
            .password_last_used
            .into_iter()
            .chain(facts.access_keys.iter().filter_map(|key| key.last_used))
            .max();

        match latest.map(|ts| self.days_since(ts)) {
            None => LastActivity::Never,
            Some(0) => LastActivity::Recently,
            Some(days) => LastActivity::DaysAgo(days.unsigned_abs()),
        }
    }

    /// A user is a removal candidate when neither the password nor any key that
    /// has ever been used was used inside the inactivity window. Keys with no
    /// recorded use do not count against removal.
    pub fn eligible_for_removal(&self, facts: &PrincipalFacts) -> bool {
        let password_idle = facts
            .principal
            .password_last_used
            .map_or(true, |ts| self.days_since(ts) >= self.inactivity_days);
        let keys_idle = facts
            .access_keys
            .iter()
            .filter_map(|key| key.last_used)
            .all(|ts| self.days_since(ts) >= self.inactivity_days);

        password_idle && keys_idle
    }

    pub fn classify(&self, facts: &PrincipalFacts) -> ReportRecord {
        ReportRecord {
            name: facts.principal.name.clone(),
            user_type: UserType::from_path(&facts.principal.path),
            access_type: AccessType::from_credentials(
                facts.login_profile,
                !facts.access_keys.is_empty(),
            ),
            permissions: Permissions::from_facts(facts.policies.permission_facts()),
            last_activity_days: self.last_activity(facts),
            eligible_for_removal: self.eligible_for_removal(facts),
        }
    }
}
