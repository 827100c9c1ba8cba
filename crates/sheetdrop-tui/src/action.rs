//! Action enum — all user-initiated intents and internal events.

use sheetdrop_proto::client::SelectedFile;

use crate::widgets::toast::Severity;

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Workflow ─────────────────────────────────────────────────────────────
    SubmitFile(SelectedFile), // one qualifying drop or picker selection
    DismissAlert,

    // ── Results ──────────────────────────────────────────────────────────────
    StartDownload,
    CopyDownloadUrl,
    ReplayReveal,

    // ── UI ───────────────────────────────────────────────────────────────────
    Notify(Severity, String),
    ToggleHelp,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
}
