//! Register use case.

use std::sync::Arc;

use emberhall_domain::{Credentials, PlayerLocation, PlayerStats, UserAccount};

use super::AccountError;
use crate::infrastructure::password::hash_password;
use crate::infrastructure::ports::{ClockPort, PlayerRepo, RandomPort, RepoError, UserRepo};

const SALT_LEN: usize = 16;

/// Creates an account along with the player's starting stats and location.
pub struct Register {
    users: Arc<dyn UserRepo>,
    players: Arc<dyn PlayerRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl Register {
    pub fn new(
        users: Arc<dyn UserRepo>,
        players: Arc<dyn PlayerRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            users,
            players,
            clock,
            random,
        }
    }

    /// Returns the normalised username.
    pub async fn execute(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let credentials = Credentials::parse(username, password)?;

        let mut salt = self.random.gen_token();
        salt.truncate(SALT_LEN);
        let account = UserAccount {
            username: credentials.username.clone(),
            password_hash: hash_password(&credentials.password, &salt),
            created_at: self.clock.now(),
            last_login: None,
        };

        self.users.create(&account).await.map_err(|e| match e {
            RepoError::ConstraintViolation(_) => AccountError::UsernameTaken,
            other => AccountError::Repo(other),
        })?;

        self.players
            .init_player(
                &account.username,
                &PlayerStats::default(),
                &PlayerLocation::default(),
            )
            .await?;

        tracing::info!(username = %account.username, "User registered");
        Ok(account.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{MockPlayerRepo, MockUserRepo};
    use chrono::Utc;

    fn register(users: MockUserRepo, players: MockPlayerRepo) -> Register {
        Register::new(
            Arc::new(users),
            Arc::new(players),
            Arc::new(FixedClock(Utc::now())),
            Arc::new(FixedRandom { int: 0, unit: 0.0 }),
        )
    }

    #[tokio::test]
    async fn creates_account_and_player_rows() {
        let mut users = MockUserRepo::new();
        users
            .expect_create()
            .withf(|account| {
                account.username == "ada" && account.password_hash.contains('$')
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut players = MockPlayerRepo::new();
        players
            .expect_init_player()
            .withf(|username, stats, location| {
                username == "ada"
                    && *stats == PlayerStats::default()
                    && *location == PlayerLocation::default()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let username = register(users, players)
            .execute("  ada ", "secret")
            .await
            .expect("register");

        assert_eq!(username, "ada");
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_storage() {
        let err = register(MockUserRepo::new(), MockPlayerRepo::new())
            .execute("ada", "no")
            .await
            .expect_err("too short");

        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_reported() {
        let mut users = MockUserRepo::new();
        users
            .expect_create()
            .returning(|_| Err(RepoError::constraint("taken")));

        let err = register(users, MockPlayerRepo::new())
            .execute("ada", "secret")
            .await
            .expect_err("taken");

        assert!(matches!(err, AccountError::UsernameTaken));
    }
}
