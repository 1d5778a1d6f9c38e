use flume::{Receiver, Sender};

use super::view::ViewModel;

/// Messages sent from the UI side to the panel runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiToCore {
    /// Action button clicked (connect or disconnect, depending on state).
    Toggle,
    /// User picked a port in the selector.
    SelectPort(String),
    /// Autostart checkbox flipped to the given value.
    SetAutostart(bool),
    /// Graceful shutdown request.
    Quit,
}

/// Messages sent from the panel runtime back to the UI side.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreToUi {
    /// The view changed; carries the full current view.
    ViewChanged(Box<ViewModel>),
    /// Runtime stopped.
    Quit,
}

/// Both channel ends a frontend holds.
#[derive(Debug, Clone)]
pub struct Bus {
    pub core_rx: Receiver<CoreToUi>,
    pub ui_tx: Sender<UiToCore>,
}

impl Bus {
    pub fn new(core_rx: Receiver<CoreToUi>, ui_tx: Sender<UiToCore>) -> Self {
        Self { core_rx, ui_tx }
    }
}

/// Core-side channel ends matching a [`Bus`].
#[derive(Debug)]
pub struct CoreEnds {
    pub ui_rx: Receiver<UiToCore>,
    pub core_tx: Sender<CoreToUi>,
}

/// Create a connected pair of UI and core channel ends.
pub fn channel() -> (Bus, CoreEnds) {
    let (ui_tx, ui_rx) = flume::unbounded();
    let (core_tx, core_rx) = flume::unbounded();
    (Bus::new(core_rx, ui_tx), CoreEnds { ui_rx, core_tx })
}

/// Parse one console line into a command. Returns `None` for blank or
/// unknown input.
pub fn parse_command(line: &str) -> Option<UiToCore> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let rest = words.collect::<Vec<_>>().join(" ");
    match verb.as_str() {
        "connect" | "disconnect" | "toggle" | "c" => Some(UiToCore::Toggle),
        "select" | "s" if !rest.is_empty() => Some(UiToCore::SelectPort(rest)),
        "autostart" => match rest.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => Some(UiToCore::SetAutostart(true)),
            "off" | "false" | "0" => Some(UiToCore::SetAutostart(false)),
            _ => None,
        },
        "quit" | "exit" | "q" => Some(UiToCore::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_commands() {
        assert_eq!(parse_command("connect"), Some(UiToCore::Toggle));
        assert_eq!(parse_command("  Disconnect "), Some(UiToCore::Toggle));
        assert_eq!(
            parse_command("select /dev/ttyUSB0"),
            Some(UiToCore::SelectPort("/dev/ttyUSB0".into()))
        );
        assert_eq!(parse_command("select"), None);
        assert_eq!(
            parse_command("autostart on"),
            Some(UiToCore::SetAutostart(true))
        );
        assert_eq!(
            parse_command("autostart OFF"),
            Some(UiToCore::SetAutostart(false))
        );
        assert_eq!(parse_command("autostart maybe"), None);
        assert_eq!(parse_command("q"), Some(UiToCore::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("dance"), None);
    }
}
