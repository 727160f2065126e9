use std::{env, str::FromStr, time::Duration};

use axum::http::HeaderValue;

/// How the roots endpoint decides that a member starts a branch of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootPolicy {
    /// Neither `father_id` nor `mother_id` is recorded.
    #[default]
    Structural,
    /// The persisted `is_root` column is set.
    Flag,
}

impl FromStr for RootPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" => Ok(Self::Structural),
            "flag" => Ok(Self::Flag),
            other => Err(anyhow::anyhow!(
                "Invalid ROOT_POLICY '{}': expected 'structural' or 'flag'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub db_max_connections: u32,
    pub query_timeout: Duration,
    pub root_policy: RootPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cors_origin = get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".into());
        let cors_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|_| anyhow::anyhow!("Invalid CORS_ORIGIN: {}", cors_origin))?;

        let query_timeout_secs: u64 = get("QUERY_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".into())
            .parse()?;
        if query_timeout_secs == 0 {
            anyhow::bail!("QUERY_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            database_url: get("DB_URL")
                .ok_or_else(|| anyhow::anyhow!("Missing required env var: DB_URL"))?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("PORT").unwrap_or_else(|| "3000".into()).parse()?,
            cors_origin,
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".into())
                .parse()?,
            query_timeout: Duration::from_secs(query_timeout_secs),
            root_policy: get("ROOT_POLICY")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}
