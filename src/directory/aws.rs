use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_iam::{
    error::{DisplayErrorContext, SdkError},
    primitives::DateTime as SmithyDateTime,
    types::AttachedPolicy,
    Client as IamClient,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::{IdentityDirectory, LookupError};
use crate::{
    classifier::{LoginProfile, Principal},
    cli::commands::aws::AwsArgs,
};

/// IAM is a global service; requests are signed for this region when none is configured.
const FALLBACK_REGION: &str = "us-east-1";
const CREDENTIAL_PROVIDER_NAME: &str = "iam_user_report";
const DEFAULT_PROFILE: &str = "default";

/// [`IdentityDirectory`] backed by the AWS IAM API.
#[derive(Clone, Debug)]
pub struct AwsDirectory {
    client: IamClient,
}

impl AwsDirectory {
    pub fn new(config: &SdkConfig) -> Self {
        Self { client: IamClient::new(config) }
    }
}

impl IdentityDirectory for AwsDirectory {
    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let pages = self
            .client
            .list_users()
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListUsers", "account", err))?;

        let mut principals = Vec::new();
        for page in pages {
            for user in page.users() {
                principals.push(Principal {
                    name: user.user_name().to_string(),
                    user_id: user.user_id().to_string(),
                    arn: user.arn().to_string(),
                    path: user.path().to_string(),
                    create_date: to_utc(user.create_date())?,
                    password_last_used: user.password_last_used().map(to_utc).transpose()?,
                });
            }
        }
        debug!("ListUsers returned {} users", principals.len());
        Ok(principals)
    }

    async fn login_profile(&self, user_name: &str) -> Result<LoginProfile> {
        match self.client.get_login_profile().user_name(user_name).send().await {
            Ok(_) => Ok(LoginProfile::Present),
            Err(err)
                if err.as_service_error().is_some_and(|e| e.is_no_such_entity_exception()) =>
            {
                Ok(LoginProfile::Absent)
            }
            Err(err) => Err(lookup_error("GetLoginProfile", user_name, err).into()),
        }
    }

    async fn access_key_ids(&self, user_name: &str) -> Result<Vec<String>> {
        let pages = self
            .client
            .list_access_keys()
            .user_name(user_name)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListAccessKeys", user_name, err))?;

        let mut ids = Vec::new();
        for key in pages.iter().flat_map(|page| page.access_key_metadata()) {
            let id = key.access_key_id().ok_or_else(|| LookupError::Incomplete {
                operation: "ListAccessKeys",
                subject: user_name.to_string(),
                field: "AccessKeyId",
            })?;
            ids.push(id.to_string());
        }
        Ok(ids)
    }

    async fn access_key_last_used(&self, access_key_id: &str) -> Result<Option<DateTime<Utc>>> {
        let output = self
            .client
            .get_access_key_last_used()
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|err| lookup_error("GetAccessKeyLastUsed", access_key_id, err))?;

        output
            .access_key_last_used()
            .and_then(|last_used| last_used.last_used_date())
            .map(to_utc)
            .transpose()
    }

    async fn attached_policies(&self, user_name: &str) -> Result<Vec<String>> {
        let pages = self
            .client
            .list_attached_user_policies()
            .user_name(user_name)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListAttachedUserPolicies", user_name, err))?;

        let policies = pages.iter().flat_map(|page| page.attached_policies());
        Ok(policy_names("ListAttachedUserPolicies", user_name, policies)?)
    }

    async fn inline_policies(&self, user_name: &str) -> Result<Vec<String>> {
        let pages = self
            .client
            .list_user_policies()
            .user_name(user_name)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListUserPolicies", user_name, err))?;

        Ok(pages.iter().flat_map(|page| page.policy_names()).cloned().collect())
    }

    async fn groups(&self, user_name: &str) -> Result<Vec<String>> {
        let pages = self
            .client
            .list_groups_for_user()
            .user_name(user_name)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListGroupsForUser", user_name, err))?;

        Ok(pages
            .iter()
            .flat_map(|page| page.groups())
            .map(|group| group.group_name().to_string())
            .collect())
    }

    async fn group_policies(&self, group_name: &str) -> Result<Vec<String>> {
        let pages = self
            .client
            .list_attached_group_policies()
            .group_name(group_name)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|err| lookup_error("ListAttachedGroupPolicies", group_name, err))?;

        let policies = pages.iter().flat_map(|page| page.attached_policies());
        Ok(policy_names("ListAttachedGroupPolicies", group_name, policies)?)
    }
}

/// Attached policy names in listing order. A record without a name is an
/// incomplete response, not something to skip.
fn policy_names<'a>(
    operation: &'static str,
    subject: &str,
    policies: impl Iterator<Item = &'a AttachedPolicy>,
) -> Result<Vec<String>, LookupError> {
    policies
        .map(|policy| {
            policy.policy_name().map(str::to_string).ok_or_else(|| LookupError::Incomplete {
                operation,
                subject: subject.to_string(),
                field: "PolicyName",
            })
        })
        .collect()
}

fn to_utc(value: &SmithyDateTime) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
        .ok_or_else(|| anyhow!("IAM timestamp out of range: {value:?}"))
}

fn lookup_error<E, R>(operation: &'static str, subject: &str, err: SdkError<E, R>) -> LookupError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    warn!("IAM {operation} failed for {subject}: {message}");
    LookupError::Api { operation, subject: subject.to_string(), message }
}

/// Builds the SDK configuration from the standard AWS chain, with any
/// overrides given on the command line.
pub async fn load_config(args: &AwsArgs) -> Result<SdkConfig> {
    let region = RegionProviderChain::first_try(args.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(FALLBACK_REGION));

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    if let Some(profile) = args.profile.as_deref() {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint) = args.endpoint_url.as_deref() {
        loader = loader.endpoint_url(endpoint);
    }
    if let Some(path) = args.credential_path.as_deref() {
        let credentials = load_credentials_from_file(path, args.profile.as_deref())?;
        loader = loader.credentials_provider(credentials);
    }

    Ok(loader.load().await)
}

fn load_credentials_from_file(path: &Path, profile: Option<&str>) -> Result<Credentials> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read AWS credential file {}", path.display()))?;

    if let Ok(value) = serde_json::from_str::<Value>(&raw) {
        return credentials_from_json(&value);
    }

    credentials_from_kv(&raw, profile)
}

fn credentials_from_json(value: &Value) -> Result<Credentials> {
    let map = value.as_object().ok_or_else(|| anyhow!("Credential JSON must be an object"))?;
    let access_key = get_case_insensitive(map, &["access_key_id", "accessKeyId", "aws_access_key_id"])
        .ok_or_else(|| anyhow!("Missing access_key_id in credential JSON"))?;
    let secret_key =
        get_case_insensitive(map, &["secret_access_key", "secretAccessKey", "aws_secret_access_key"])
            .ok_or_else(|| anyhow!("Missing secret_access_key in credential JSON"))?;
    let session_token =
        get_case_insensitive(map, &["session_token", "sessionToken", "aws_session_token"]);

    Ok(Credentials::new(access_key, secret_key, session_token, None, CREDENTIAL_PROVIDER_NAME))
}

fn get_case_insensitive(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_str().map(|s| s.to_string()))
    })
}

/// Reads `key = value` lines. Files with `[section]` headers only contribute
/// the section named by `profile` (or `default`); a headerless export is read
/// as a whole.
fn credentials_from_kv(raw: &str, profile: Option<&str>) -> Result<Credentials> {
    let wanted = profile.unwrap_or(DEFAULT_PROFILE);
    let mut headerless = CredentialEntries::default();
    let mut selected = CredentialEntries::default();
    let mut section: Option<&str> = None;
    let mut saw_sections = false;
    let mut found = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            let header = header.trim();
            let name = header.strip_prefix("profile ").map(str::trim).unwrap_or(header);
            saw_sections = true;
            found |= name == wanted;
            section = Some(name);
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else { continue };
        let entries = match section {
            None => &mut headerless,
            Some(name) if name == wanted => &mut selected,
            Some(_) => continue,
        };
        entries.set(key, value);
    }

    if !saw_sections {
        return headerless.into_credentials("credential file");
    }
    if !found {
        bail!("Profile [{wanted}] not found in credential file");
    }
    selected.into_credentials(&format!("credential file profile [{wanted}]"))
}

#[derive(Default)]
struct CredentialEntries {
    access_key: Option<String>,
    secret_key: Option<String>,
    session_token: Option<String>,
}

impl CredentialEntries {
    fn set(&mut self, key: &str, value: &str) {
        let value = Some(value.trim().to_string());
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" | "access_key_id" => self.access_key = value,
            "aws_secret_access_key" | "secret_access_key" => self.secret_key = value,
            "aws_session_token" | "session_token" => self.session_token = value,
            _ => {}
        }
    }

    fn into_credentials(self, source: &str) -> Result<Credentials> {
        let access_key =
            self.access_key.ok_or_else(|| anyhow!("Missing aws_access_key_id in {source}"))?;
        let secret_key =
            self.secret_key.ok_or_else(|| anyhow!("Missing aws_secret_access_key in {source}"))?;
        Ok(Credentials::new(
            access_key,
            secret_key,
            self.session_token,
            None,
            CREDENTIAL_PROVIDER_NAME,
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn credentials_from_json_accepts_mixed_case_keys() {
        let creds = credentials_from_json(&json!({
            "AccessKeyId": "AKIAEXAMPLE",
            "SecretAccessKey": "secret",
            "SessionToken": "token",
        }))
        .unwrap();
        assert_eq!(creds.access_key_id(), "AKIAEXAMPLE");
        assert_eq!(creds.secret_access_key(), "secret");
        assert_eq!(creds.session_token(), Some("token"));
    }

    #[test]
    fn credentials_from_json_requires_secret() {
        let err = credentials_from_json(&json!({ "access_key_id": "AKIAEXAMPLE" })).unwrap_err();
        assert_eq!(err.to_string(), "Missing secret_access_key in credential JSON");
    }

    #[test]
    fn credentials_from_kv_reads_profile_style_file() {
        let creds = credentials_from_kv(
            "[default]\n# exported for audit\naws_access_key_id = AKIAEXAMPLE\naws_secret_access_key = secret\n",
            None,
        )
        .unwrap();
        assert_eq!(creds.access_key_id(), "AKIAEXAMPLE");
        assert_eq!(creds.secret_access_key(), "secret");
        assert_eq!(creds.session_token(), None);
    }

    #[test]
    fn credentials_from_kv_requires_access_key() {
        let err = credentials_from_kv("aws_secret_access_key = secret", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing aws_access_key_id in credential file");
    }

    const TWO_PROFILES: &str = "[default]\n\
        aws_access_key_id = AKIADEFAULT\n\
        aws_secret_access_key = default-secret\n\
        \n\
        [prod]\n\
        aws_access_key_id = AKIAPROD\n";

    #[test]
    fn credentials_from_kv_reads_only_default_section() {
        let creds = credentials_from_kv(TWO_PROFILES, None).unwrap();
        assert_eq!(creds.access_key_id(), "AKIADEFAULT");
        assert_eq!(creds.secret_access_key(), "default-secret");
    }

    #[test]
    fn credentials_from_kv_does_not_mix_profiles() {
        let err = credentials_from_kv(TWO_PROFILES, Some("prod")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing aws_secret_access_key in credential file profile [prod]"
        );
    }

    #[test]
    fn credentials_from_kv_selects_named_profile() {
        let raw =
            format!("{TWO_PROFILES}aws_secret_access_key = prod-secret\naws_session_token = tok\n");
        let creds = credentials_from_kv(&raw, Some("prod")).unwrap();
        assert_eq!(creds.access_key_id(), "AKIAPROD");
        assert_eq!(creds.secret_access_key(), "prod-secret");
        assert_eq!(creds.session_token(), Some("tok"));
    }

    #[test]
    fn credentials_from_kv_accepts_config_style_headers() {
        let raw = "[profile audit]\naws_access_key_id = AKIAAUDIT\naws_secret_access_key = s\n";
        let creds = credentials_from_kv(raw, Some("audit")).unwrap();
        assert_eq!(creds.access_key_id(), "AKIAAUDIT");
    }

    #[test]
    fn credentials_from_kv_requires_selected_profile() {
        let err = credentials_from_kv(TWO_PROFILES, Some("staging")).unwrap_err();
        assert_eq!(err.to_string(), "Profile [staging] not found in credential file");
    }

    #[test]
    fn missing_credential_file_is_reported() {
        let err = load_credentials_from_file(Path::new("/no/such/credentials"), None).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read AWS credential file"));
    }

    #[test]
    fn policy_names_keep_listing_order() {
        let policies = [
            AttachedPolicy::builder().policy_name("ReadOnlyAccess").build(),
            AttachedPolicy::builder().policy_name("Billing").build(),
        ];
        let names = policy_names("ListAttachedGroupPolicies", "admins", policies.iter()).unwrap();
        assert_eq!(names, vec!["ReadOnlyAccess".to_string(), "Billing".to_string()]);
    }

    #[test]
    fn policy_without_name_is_incomplete() {
        let policies = [
            AttachedPolicy::builder().policy_name("ReadOnlyAccess").build(),
            AttachedPolicy::builder().policy_arn("arn:aws:iam::aws:policy/Unnamed").build(),
        ];
        let err = policy_names("ListAttachedUserPolicies", "alice", policies.iter()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ListAttachedUserPolicies returned an incomplete record for alice: missing PolicyName"
        );
    }

    #[test]
    fn smithy_timestamps_convert_to_utc() {
        let ts = SmithyDateTime::from_secs_and_nanos(1_717_243_200, 500);
        let converted = to_utc(&ts).unwrap();
        assert_eq!(converted.timestamp(), 1_717_243_200);
        assert_eq!(converted.timestamp_subsec_nanos(), 500);
    }
}
