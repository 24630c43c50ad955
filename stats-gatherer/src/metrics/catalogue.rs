use serde::Serialize;
use strum::{
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
};

/// Every memcached stat that is translated into a metric.
///
/// The snake_case name of a variant is both the protocol stat key and the emitted field name,
/// so the key → field table is the enum itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatField {
    // process
    Pid,
    Uptime,
    Time,
    PointerSize,
    RusageUser,
    RusageSystem,
    Threads,

    // items and memory
    CurrItems,
    TotalItems,
    Bytes,
    LimitMaxbytes,
    Evictions,
    Reclaimed,

    // connections
    CurrConnections,
    TotalConnections,
    ConnectionStructures,
    ReservedFds,

    // commands
    CmdGet,
    CmdSet,
    CmdFlush,
    CmdTouch,
    GetHits,
    GetMisses,
    DeleteHits,
    DeleteMisses,
    IncrHits,
    IncrMisses,
    DecrHits,
    DecrMisses,
    CasHits,
    CasMisses,
    CasBadval,
    TouchHits,
    TouchMisses,
    AuthCmds,
    AuthErrors,

    // network
    BytesRead,
    BytesWritten,
}

impl StatField {
    /// Maps a protocol stat key to its field. Unknown keys map to `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
