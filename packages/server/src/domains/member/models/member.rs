use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::MemberId;

/// Verified institutional affiliation, decided server-side when the
/// identity-provider profile is synced. Combo pricing keys off this,
/// never off an email prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Affiliation {
    Host,
    Guest,
}

impl Affiliation {
    /// Classify an email against the configured host-institution domains.
    pub fn from_email_domain(email: &str, host_domains: &[String]) -> Self {
        let domain = email.rsplit('@').next().unwrap_or("");
        if host_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
            Affiliation::Host
        } else {
            Affiliation::Guest
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: MemberId,
    pub kinde_id: String,
    pub email: String,
    pub full_name: String,
    pub affiliation: Affiliation,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create or refresh a member row from identity-provider profile data.
    /// The affiliation is recomputed on every sync; admin status is managed
    /// out of band and never touched here.
    pub async fn upsert_from_identity(
        kinde_id: &str,
        email: &str,
        full_name: &str,
        affiliation: Affiliation,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO members (id, kinde_id, email, full_name, affiliation)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (kinde_id) DO UPDATE
            SET email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                affiliation = EXCLUDED.affiliation,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(MemberId::new())
        .bind(kinde_id)
        .bind(email)
        .bind(full_name)
        .bind(affiliation)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_kinde_id(kinde_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE kinde_id = $1")
            .bind(kinde_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// First name for the payment gateway's checkout form.
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("Guest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_domains() -> Vec<String> {
        vec!["snu.edu.in".to_string()]
    }

    #[test]
    fn host_domain_email_is_host() {
        let affiliation = Affiliation::from_email_domain("asha@snu.edu.in", &host_domains());
        assert_eq!(affiliation, Affiliation::Host);
    }

    #[test]
    fn domain_match_is_case_insensitive() {
        let affiliation = Affiliation::from_email_domain("asha@SNU.EDU.IN", &host_domains());
        assert_eq!(affiliation, Affiliation::Host);
    }

    #[test]
    fn other_domains_are_guest() {
        let affiliation = Affiliation::from_email_domain("asha@gmail.com", &host_domains());
        assert_eq!(affiliation, Affiliation::Guest);
    }

    #[test]
    fn no_configured_domains_means_guest() {
        let affiliation = Affiliation::from_email_domain("asha@snu.edu.in", &[]);
        assert_eq!(affiliation, Affiliation::Guest);
    }
}
