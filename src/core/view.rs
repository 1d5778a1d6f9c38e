//! View model of the panel.
//!
//! One field per UI element the reconciler drives, named after the element
//! IDs of the page (`status-text`, `port-select`, `conn-btn`, ...). The view is
//! derived state only: the reconciler writes it and never reads it back to
//! decide the connection state.
//!
//! Setters compare before writing and bump [`ViewModel::revision`] only when
//! something actually changed, so repeated identical snapshots cause no
//! redraw.

use serde::Serialize;

/// Text shown as the only entry of an empty port list.
pub const NO_PORTS_PLACEHOLDER: &str = "No Ports Found";

pub const WAITING_TEXT: &str = "Waiting for connection...";
pub const DISCONNECTED_TEXT: &str = "Disconnected";

/// Element IDs the view model stands in for.
pub mod ids {
    pub const AUTOSTART_CB: &str = "autostart-cb";
    pub const STATUS_TEXT: &str = "status-text";
    pub const PORT_SELECT: &str = "port-select";
    pub const CONN_BTN: &str = "conn-btn";
    pub const CPU: &str = "cpu";
    pub const DL_VAL: &str = "dl-val";
    pub const DL_UNIT: &str = "dl-unit";
    pub const RAM: &str = "ram";
    pub const DISK: &str = "disk";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Error,
    Neutral,
}

impl Tone {
    pub fn hex(self) -> &'static str {
        match self {
            Tone::Success => "#10b981",
            Tone::Error => "#ef4444",
            Tone::Neutral => "#888",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

/// The action button's two affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ButtonMode {
    Connect,
    Disconnect,
}

impl ButtonMode {
    pub fn label(self) -> &'static str {
        match self {
            ButtonMode::Connect => "Connect",
            ButtonMode::Disconnect => "Disconnect",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            ButtonMode::Connect => "btn-blue",
            ButtonMode::Disconnect => "btn-red",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortSelect {
    /// Real port names. Empty means the placeholder entry is shown.
    pub options: Vec<String>,
    pub selected: Option<String>,
    pub disabled: bool,
}

impl PortSelect {
    pub fn shows_placeholder(&self) -> bool {
        self.options.is_empty()
    }

    /// Entries as displayed, including the placeholder.
    pub fn entries(&self) -> Vec<&str> {
        if self.options.is_empty() {
            vec![NO_PORTS_PLACEHOLDER]
        } else {
            self.options.iter().map(String::as_str).collect()
        }
    }

    /// The selected real port. The placeholder never counts as a port.
    pub fn selected_port(&self) -> Option<&str> {
        self.selected
            .as_deref()
            .filter(|p| !p.is_empty() && *p != NO_PORTS_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    pub checked: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub autostart: Checkbox,
    pub status: StatusLine,
    pub port_select: PortSelect,
    pub button: ButtonMode,
    pub cpu: String,
    pub dl_val: String,
    pub dl_unit: String,
    pub ram: String,
    pub disk: String,
    pub revision: u64,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            autostart: Checkbox::default(),
            status: StatusLine {
                text: String::new(),
                tone: Tone::Neutral,
            },
            port_select: PortSelect::default(),
            button: ButtonMode::Connect,
            cpu: "--".into(),
            dl_val: "0".into(),
            dl_unit: "KB/s".into(),
            ram: "--".into(),
            disk: "--".into(),
            revision: 0,
        }
    }
}

/// Assign `value` to `slot` if it differs; report whether it did.
fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl ViewModel {
    fn touch(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn set_status(&mut self, text: impl Into<String>, tone: Tone) -> bool {
        let changed = assign(
            &mut self.status,
            StatusLine {
                text: text.into(),
                tone,
            },
        );
        self.touch(changed)
    }

    /// Rebuild the port list, keeping the current selection when it is still
    /// listed and falling back to the first port otherwise.
    pub fn set_port_options(&mut self, ports: &[String]) -> bool {
        let selected = match self.port_select.selected.as_ref() {
            Some(current) if ports.contains(current) => Some(current.clone()),
            _ => ports.first().cloned(),
        };
        let options_changed = assign(&mut self.port_select.options, ports.to_vec());
        let selected_changed = assign(&mut self.port_select.selected, selected);
        self.touch(options_changed || selected_changed)
    }

    /// Select `port` if it is listed; an unlisted port clears the selection.
    pub fn force_select(&mut self, port: &str) -> bool {
        let selected = self
            .port_select
            .options
            .iter()
            .find(|p| p.as_str() == port)
            .cloned();
        let changed = assign(&mut self.port_select.selected, selected);
        self.touch(changed)
    }

    pub fn set_selector_disabled(&mut self, disabled: bool) -> bool {
        let changed = assign(&mut self.port_select.disabled, disabled);
        self.touch(changed)
    }

    pub fn set_button(&mut self, mode: ButtonMode) -> bool {
        let changed = assign(&mut self.button, mode);
        self.touch(changed)
    }

    pub fn set_autostart(&mut self, checkbox: Checkbox) -> bool {
        let changed = assign(&mut self.autostart, checkbox);
        self.touch(changed)
    }

    /// Write a display element by its element ID. Unknown IDs are ignored.
    pub fn set_text(&mut self, id: &str, value: String) -> bool {
        let slot = match id {
            ids::CPU => &mut self.cpu,
            ids::DL_VAL => &mut self.dl_val,
            ids::DL_UNIT => &mut self.dl_unit,
            ids::RAM => &mut self.ram,
            ids::DISK => &mut self.disk,
            other => {
                log::warn!("view: no text element with id {other}");
                return false;
            }
        };
        let changed = assign(slot, value);
        self.touch(changed)
    }

    /// Read a text element by its element ID.
    pub fn text(&self, id: &str) -> Option<&str> {
        match id {
            ids::STATUS_TEXT => Some(&self.status.text),
            ids::CONN_BTN => Some(self.button.label()),
            ids::CPU => Some(&self.cpu),
            ids::DL_VAL => Some(&self.dl_val),
            ids::DL_UNIT => Some(&self.dl_unit),
            ids::RAM => Some(&self.ram),
            ids::DISK => Some(&self.disk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_writes_do_not_bump_revision() {
        let mut view = ViewModel::default();
        assert!(view.set_status("Waiting for connection...", Tone::Neutral));
        let rev = view.revision;
        assert!(!view.set_status("Waiting for connection...", Tone::Neutral));
        assert!(!view.set_button(ButtonMode::Connect));
        assert_eq!(view.revision, rev);
        assert!(view.set_status("Waiting for connection...", Tone::Error));
        assert_eq!(view.revision, rev + 1);
    }

    #[test]
    fn rebuild_preserves_selection_when_still_listed() {
        let mut view = ViewModel::default();
        view.set_port_options(&ports(&["COM1", "COM3"]));
        assert_eq!(view.port_select.selected_port(), Some("COM1"));
        view.force_select("COM3");
        view.set_port_options(&ports(&["COM3", "COM4"]));
        assert_eq!(view.port_select.selected_port(), Some("COM3"));
        view.set_port_options(&ports(&["COM4"]));
        assert_eq!(view.port_select.selected_port(), Some("COM4"));
    }

    #[test]
    fn empty_list_shows_placeholder_without_selection() {
        let mut view = ViewModel::default();
        view.set_port_options(&ports(&["COM1"]));
        view.set_port_options(&[]);
        assert!(view.port_select.shows_placeholder());
        assert_eq!(view.port_select.entries(), vec![NO_PORTS_PLACEHOLDER]);
        assert_eq!(view.port_select.selected_port(), None);
    }

    #[test]
    fn placeholder_text_never_counts_as_port() {
        let select = PortSelect {
            options: vec![],
            selected: Some(NO_PORTS_PLACEHOLDER.into()),
            disabled: false,
        };
        assert_eq!(select.selected_port(), None);
    }

    #[test]
    fn text_elements_by_id() {
        let mut view = ViewModel::default();
        assert!(view.set_text(ids::CPU, "12%".into()));
        assert!(!view.set_text(ids::CPU, "12%".into()));
        assert!(!view.set_text("nope", "x".into()));
        assert_eq!(view.text(ids::CPU), Some("12%"));
        assert_eq!(view.text(ids::CONN_BTN), Some("Connect"));
        assert_eq!(ButtonMode::Disconnect.class(), "btn-red");
        assert_eq!(Tone::Success.hex(), "#10b981");
    }
}
