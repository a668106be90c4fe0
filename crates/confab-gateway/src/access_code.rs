//! Generates 8-digit numeric access codes with collision retry (spec.md §4.10).

use rand::rngs::OsRng;
use rand::Rng;

use confab_core::domain::ACCESS_CODE_LEN;
use confab_core::error::{GatewayError, Result};

use crate::repo::{AccessCodeConflict, RepoStore};

const MAX_ATTEMPTS: u32 = 5;

pub struct AccessCodeIssuer;

impl AccessCodeIssuer {
    fn generate() -> String {
        let mut rng = OsRng;
        (0..ACCESS_CODE_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10)))
            .collect()
    }

    /// Generates a fresh code and attempts `create_meeting`, retrying on
    /// `AccessCodeConflict` up to [`MAX_ATTEMPTS`] times before surfacing
    /// `CodeExhaustion` (mapped here to `GatewayError::Conflict`).
    pub async fn create_meeting_with_fresh_code(
        repo: &dyn RepoStore,
        director_id: uuid::Uuid,
        title: &str,
        description: &str,
        duration_minutes: i32,
    ) -> Result<confab_core::domain::Meeting> {
        for attempt in 0..MAX_ATTEMPTS {
            let code = Self::generate();
            match repo
                .create_meeting(director_id, &code, title, description, duration_minutes)
                .await?
            {
                Ok(meeting) => return Ok(meeting),
                Err(AccessCodeConflict) => {
                    tracing::warn!(attempt, "access code collision, retrying");
                }
            }
        }
        Err(GatewayError::Conflict("access code space exhausted".into()))
    }
}
