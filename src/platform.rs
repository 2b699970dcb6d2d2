//! Process-wide host, user, and thread identity lookups.
//!
//! Host and user names are resolved once and cached for the process
//! lifetime; they are read-only afterwards and safe to share between
//! clients.

use std::{
    cell::Cell,
    env,
    sync::atomic::{AtomicU64, Ordering},
};

use once_cell::sync::Lazy;

const FALLBACK_HOST_NAME: &str = "localhost";
const FALLBACK_USER_NAME: &str = "User";

static HOST_INFO: Lazy<HostInfo> = Lazy::new(HostInfo::detect);

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Identity of the machine and account emitting events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostInfo {
    pub host_name: String,
    pub user_name: String,
}

impl HostInfo {
    /// Build a fixed identity, mainly for tests and embedding.
    pub fn new(host_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            user_name: user_name.into(),
        }
    }

    /// The cached identity of the current process.
    pub fn current() -> &'static HostInfo {
        &HOST_INFO
    }

    fn detect() -> Self {
        let host_name = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_HOST_NAME.to_owned());
        let user_name = ["USER", "USERNAME", "LOGNAME"]
            .iter()
            .find_map(|key| env::var(key).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| FALLBACK_USER_NAME.to_owned());
        Self {
            host_name,
            user_name,
        }
    }
}

/// Numeric identifier of the calling thread.
///
/// Ids are handed out on first use and stay fixed for the thread's lifetime.
/// `std::thread::ThreadId` has no stable integer form, and viewers expect a
/// number in the `thread` attribute.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|slot| {
        let id = slot.get();
        if id != 0 {
            return id;
        }
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        slot.set(id);
        id
    })
}
