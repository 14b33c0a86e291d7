use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Process-wide list of revoked token ids
static TOKEN_BLACKLIST: Lazy<TokenBlacklist> = Lazy::new(TokenBlacklist::new);

const DEFAULT_MAX_SIZE: usize = 10_000;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Revoked tokens keyed by their `jti` claim.
///
/// Each entry keeps the natural expiry of the token and the time it was
/// revoked. Entries are dropped once the token would have expired anyway, and
/// when the list is full the oldest revocations are evicted first.
pub struct TokenBlacklist {
    // jti -> (expires_at, revoked_at)
    revoked_tokens: Mutex<HashMap<String, (SystemTime, SystemTime)>>,
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revoked_tokens: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated
    fn tokens(&self) -> MutexGuard<'_, HashMap<String, (SystemTime, SystemTime)>> {
        self.revoked_tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Revoke the token with id `jti` until `expiration`
    pub fn revoke_token(&self, jti: &str, expiration: SystemTime) {
        let mut tokens = self.tokens();

        if tokens.len() >= self.max_size {
            warn!("Token blacklist reached max size ({}), pruning", self.max_size);
            Self::remove_expired(&mut tokens);

            if tokens.len() >= self.max_size {
                Self::remove_oldest_entries(&mut tokens, (self.max_size / 2).max(1));
            }
        }

        tokens.insert(jti.to_string(), (expiration, SystemTime::now()));
        info!("Token revoked: {}", jti);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.tokens().contains_key(jti)
    }

    pub fn size(&self) -> usize {
        self.tokens().len()
    }

    /// Drop entries whose token has expired; returns how many were removed
    pub fn cleanup_expired_tokens(&self) -> usize {
        let mut tokens = self.tokens();
        Self::remove_expired(&mut tokens)
    }

    fn remove_expired(tokens: &mut HashMap<String, (SystemTime, SystemTime)>) -> usize {
        let now = SystemTime::now();
        let before = tokens.len();
        tokens.retain(|_, (expiration, _)| *expiration > now);

        let removed = before - tokens.len();
        if removed > 0 {
            debug!("Removed {} expired tokens from blacklist", removed);
        }
        removed
    }

    fn remove_oldest_entries(tokens: &mut HashMap<String, (SystemTime, SystemTime)>, count: usize) {
        let mut by_revocation: Vec<(String, SystemTime)> = tokens
            .iter()
            .map(|(jti, (_, revoked_at))| (jti.clone(), *revoked_at))
            .collect();
        by_revocation.sort_by_key(|(_, revoked_at)| *revoked_at);

        for (jti, _) in by_revocation.into_iter().take(count) {
            tokens.remove(&jti);
        }
        debug!("Removed {} oldest entries from token blacklist", count);
    }
}

/// The global token blacklist
pub fn blacklist() -> &'static TokenBlacklist {
    &TOKEN_BLACKLIST
}

/// Prune the global blacklist every hour until `cancel` fires
pub fn start_cleanup_task(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let removed = blacklist().cleanup_expired_tokens();
                    debug!("Blacklist cleanup removed {}, {} remain", removed, blacklist().size());
                }
            }
        }
        debug!("Token blacklist cleanup task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_revoke_and_check_token() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke_token("jti-1", SystemTime::now() + Duration::from_secs(60));

        assert!(blacklist.is_revoked("jti-1"));
        assert!(!blacklist.is_revoked("jti-2"));
    }

    #[test]
    fn test_cleanup_expired_tokens() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke_token("expired", SystemTime::now() - Duration::from_secs(1));
        blacklist.revoke_token("valid", SystemTime::now() + Duration::from_secs(60));
        assert_eq!(blacklist.size(), 2);

        assert_eq!(blacklist.cleanup_expired_tokens(), 1);
        assert!(!blacklist.is_revoked("expired"));
        assert!(blacklist.is_revoked("valid"));
    }

    #[test]
    fn test_full_blacklist_evicts_oldest() {
        let blacklist = TokenBlacklist::with_max_size(4);
        for i in 0..4 {
            blacklist.revoke_token(&format!("jti-{}", i), SystemTime::now() + Duration::from_secs(300));
            sleep(Duration::from_millis(5));
        }

        blacklist.revoke_token("newest", SystemTime::now() + Duration::from_secs(300));

        assert_eq!(blacklist.size(), 3);
        assert!(!blacklist.is_revoked("jti-0"));
        assert!(!blacklist.is_revoked("jti-1"));
        assert!(blacklist.is_revoked("jti-3"));
        assert!(blacklist.is_revoked("newest"));
    }

    #[tokio::test]
    async fn test_cleanup_task_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let handle = start_cleanup_task(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
