//! Which settings tabs and account-menu entries a session may see.

use serde::Deserialize;
use serde::Serialize;

use crate::guard::AccessGuard;
use crate::role::Action;
use crate::role::Resource;
use crate::session::SessionState;

/// Tabs of the settings page, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsView {
    UiSettings,
    CameraSettings,
    MasksZones,
    MotionTuner,
    AiPreview,
    Users,
    AuditLogs,
}

impl SettingsView {
    pub const ALL: [SettingsView; 7] = [
        SettingsView::UiSettings,
        SettingsView::CameraSettings,
        SettingsView::MasksZones,
        SettingsView::MotionTuner,
        SettingsView::AiPreview,
        SettingsView::Users,
        SettingsView::AuditLogs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsView::UiSettings => "UI settings",
            SettingsView::CameraSettings => "camera settings",
            SettingsView::MasksZones => "masks / zones",
            SettingsView::MotionTuner => "motion tuner",
            SettingsView::AiPreview => "Ai Preview",
            SettingsView::Users => "users",
            SettingsView::AuditLogs => "audit logs",
        }
    }

    /// Capability needed to open the tab, if any.
    pub fn requirement(self) -> Option<(Resource, Action)> {
        match self {
            SettingsView::Users => Some((Resource::Users, Action::View)),
            SettingsView::AuditLogs => Some((Resource::Logs, Action::View)),
            _ => None,
        }
    }
}

/// Entries of the account menu that depend on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuEntry {
    SystemMetrics,
    Settings,
    ExportCreate,
    ExportDownload,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 4] = [
        MenuEntry::SystemMetrics,
        MenuEntry::Settings,
        MenuEntry::ExportCreate,
        MenuEntry::ExportDownload,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuEntry::SystemMetrics => "System metrics",
            MenuEntry::Settings => "Settings",
            MenuEntry::ExportCreate => "Export",
            MenuEntry::ExportDownload => "Download export",
        }
    }

    pub fn requirement(self) -> Option<(Resource, Action)> {
        match self {
            MenuEntry::SystemMetrics => None,
            MenuEntry::Settings => Some((Resource::Config, Action::View)),
            MenuEntry::ExportCreate => Some((Resource::Export, Action::Create)),
            MenuEntry::ExportDownload => Some((Resource::Export, Action::Download)),
        }
    }
}

fn permits(
    guard: &AccessGuard<'_>,
    session: &SessionState,
    requirement: Option<(Resource, Action)>,
) -> bool {
    if session.effective_role(guard.policy()).is_none() {
        return false;
    }
    match requirement {
        Some((resource, action)) => guard.allows(session, resource, action),
        None => true,
    }
}

pub fn visible_views(guard: &AccessGuard<'_>, session: &SessionState) -> Vec<SettingsView> {
    SettingsView::ALL
        .into_iter()
        .filter(|view| permits(guard, session, view.requirement()))
        .collect()
}

pub fn visible_menu(guard: &AccessGuard<'_>, session: &SessionState) -> Vec<MenuEntry> {
    MenuEntry::ALL
        .into_iter()
        .filter(|entry| permits(guard, session, entry.requirement()))
        .collect()
}
