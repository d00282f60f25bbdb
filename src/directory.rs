use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    classifier::{AccessKeyFact, GroupFacts, LoginProfile, PolicyFacts, Principal, PrincipalFacts},
    util::Counted,
};

pub mod aws;

/// A failed read against the identity provider.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("{operation} failed for {subject}: {message}")]
    Api { operation: &'static str, subject: String, message: String },

    #[error("{operation} returned an incomplete record for {subject}: missing {field}")]
    Incomplete { operation: &'static str, subject: String, field: &'static str },
}

/// Read-only view of the identity provider.
///
/// Every method except [`IdentityDirectory::login_profile`] treats any
/// failure as fatal. `login_profile` maps the provider's "no such entity"
/// response to [`LoginProfile::Absent`].
#[allow(async_fn_in_trait)]
pub trait IdentityDirectory {
    /// All users, with pagination exhausted.
    async fn list_principals(&self) -> Result<Vec<Principal>>;

    async fn login_profile(&self, user_name: &str) -> Result<LoginProfile>;

    async fn access_key_ids(&self, user_name: &str) -> Result<Vec<String>>;

    async fn access_key_last_used(&self, access_key_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// Names of managed policies attached directly to the user.
    async fn attached_policies(&self, user_name: &str) -> Result<Vec<String>>;

    async fn inline_policies(&self, user_name: &str) -> Result<Vec<String>>;

    async fn groups(&self, user_name: &str) -> Result<Vec<String>>;

    /// Names of managed policies attached to the group.
    async fn group_policies(&self, group_name: &str) -> Result<Vec<String>>;
}

/// Runs every lookup for one user, one after another, and bundles the results.
pub async fn gather_facts<D: IdentityDirectory>(
    directory: &D,
    principal: Principal,
) -> Result<PrincipalFacts> {
    let user = principal.name.as_str();
    debug!("Gathering access facts for {user}");

    let login_profile = directory.login_profile(user).await?;
    trace!("{user}: login profile {login_profile:?}");

    let mut access_keys = Vec::new();
    for access_key_id in directory.access_key_ids(user).await? {
        let last_used = directory.access_key_last_used(&access_key_id).await?;
        trace!("{user}: access key {access_key_id} last used {last_used:?}");
        access_keys.push(AccessKeyFact { access_key_id, last_used });
    }

    let managed = directory.attached_policies(user).await?;
    let inline = directory.inline_policies(user).await?;

    let mut groups = Vec::new();
    for name in directory.groups(user).await? {
        let attached_policies = directory.group_policies(&name).await?;
        groups.push(GroupFacts { name, attached_policies });
    }

    debug!(
        "{user}: {}, {}, {}, {}",
        Counted::regular(access_keys.len(), "access key"),
        Counted::new(managed.len(), "managed policy", "managed policies"),
        Counted::new(inline.len(), "inline policy", "inline policies"),
        Counted::regular(groups.len(), "group")
    );

    Ok(PrincipalFacts {
        principal,
        login_profile,
        access_keys,
        policies: PolicyFacts { managed, inline, groups },
    })
}
