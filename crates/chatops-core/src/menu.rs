//! Command menu
//!
//! The configured rows of `name:description` entries become three things
//! built once at startup: the inline keyboard layout, the recognized
//! command set and the help listing. Malformed or duplicate entries abort
//! construction; a menu that parses is a menu that is fully usable.

use crate::error::{Error, Result};
use crate::event::{Button, Keyboard};

/// Built-in entries appended to every help listing.
const BUILTIN_HELP: [&str; 2] = ["help - get help", "logout - log out"];

/// Static catalog of recognized commands and their display layout.
#[derive(Debug, Clone)]
pub struct CommandMenu {
    keyboard: Keyboard,
    commands: Vec<String>,
    help: Vec<String>,
}

impl CommandMenu {
    /// Build the menu from configured rows.
    ///
    /// Each entry is split on its first `:` into a command name and a
    /// button label. An entry without a separator, with an empty name,
    /// or whose name repeats an earlier entry is a construction error.
    pub fn build(rows: &[Vec<String>]) -> Result<Self> {
        let mut keyboard = Keyboard::default();
        let mut commands: Vec<String> = Vec::new();
        let mut help: Vec<String> = Vec::new();

        for row in rows {
            let mut buttons = Vec::new();
            for entry in row {
                let Some((name, description)) = entry.split_once(':') else {
                    return Err(Error::Menu(format!(
                        "menu entry {entry:?} is missing the name:description separator"
                    )));
                };
                if name.is_empty() {
                    return Err(Error::Menu(format!(
                        "menu entry {entry:?} has an empty command name"
                    )));
                }
                if commands.iter().any(|c| c == name) {
                    return Err(Error::Menu(format!("duplicate menu command {name:?}")));
                }

                buttons.push(Button {
                    label: description.to_string(),
                    path: format!("/{name}"),
                });
                commands.push(name.to_string());
                help.push(format!("{name} - {description}"));
            }
            keyboard.rows.push(buttons);
        }

        commands.sort();
        help.sort();

        Ok(Self {
            keyboard,
            commands,
            help,
        })
    }

    /// Whether `name` (without the leading slash) is a menu command.
    pub fn is_command(&self, name: &str) -> bool {
        self.commands.binary_search_by(|c| c.as_str().cmp(name)).is_ok()
    }

    /// Recognized command names, sorted.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Inline keyboard layout, row order as configured.
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Usage help shown to an authenticated chat.
    pub fn usage_text(&self, key_id: &str) -> String {
        let commands: String = self.help.iter().map(|line| format!("/{line}\n")).collect();
        let builtin: String = BUILTIN_HELP.iter().map(|line| format!("/{line}\n")).collect();
        format!("Usage:\n\n{commands}\n{builtin}\ncurrent API key: {key_id}")
    }

    /// Newline-joined command listing, no slash prefix.
    pub fn command_list(&self) -> String {
        self.help
            .iter()
            .map(String::as_str)
            .chain(BUILTIN_HELP)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(entries: &[&[&str]]) -> Vec<Vec<String>> {
        entries
            .iter()
            .map(|row| row.iter().map(|e| e.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_build_keeps_row_layout() {
        let menu = CommandMenu::build(&rows(&[
            &["status:System status", "report:Daily report"],
            &["restart:Restart service"],
        ]))
        .unwrap();

        let keyboard = menu.keyboard();
        assert_eq!(keyboard.rows.len(), 2);
        assert_eq!(keyboard.rows[0].len(), 2);
        assert_eq!(keyboard.rows[0][0].label, "System status");
        assert_eq!(keyboard.rows[0][0].path, "/status");
        assert_eq!(keyboard.rows[1][0].path, "/restart");
    }

    #[test]
    fn test_commands_sorted() {
        let menu = CommandMenu::build(&rows(&[&["zeta:Z", "alpha:A"]])).unwrap();
        assert_eq!(menu.commands(), &["alpha", "zeta"]);
    }

    #[test]
    fn test_is_command() {
        let menu = CommandMenu::build(&rows(&[&["status:System status"]])).unwrap();
        assert!(menu.is_command("status"));
        assert!(!menu.is_command("stat"));
        assert!(!menu.is_command("help"));
    }

    #[test]
    fn test_description_may_contain_separator() {
        let menu = CommandMenu::build(&rows(&[&["time:Time: UTC"]])).unwrap();
        assert!(menu.is_command("time"));
        assert_eq!(menu.keyboard().rows[0][0].label, "Time: UTC");
    }

    #[test]
    fn test_entry_without_separator_rejected() {
        let result = CommandMenu::build(&rows(&[&["status"]]));
        assert!(matches!(result, Err(Error::Menu(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = CommandMenu::build(&rows(&[&[":System status"]]));
        assert!(matches!(result, Err(Error::Menu(_))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = CommandMenu::build(&rows(&[
            &["status:System status"],
            &["status:Other status"],
        ]));
        assert!(matches!(result, Err(Error::Menu(_))));
    }

    #[test]
    fn test_usage_text_format() {
        let menu = CommandMenu::build(&rows(&[&["zeta:Z", "alpha:A"]])).unwrap();
        assert_eq!(
            menu.usage_text("operator"),
            "Usage:\n\n/alpha - A\n/zeta - Z\n\n/help - get help\n/logout - log out\n\ncurrent API key: operator"
        );
    }

    #[test]
    fn test_command_list_format() {
        let menu = CommandMenu::build(&rows(&[&["zeta:Z", "alpha:A"]])).unwrap();
        assert_eq!(
            menu.command_list(),
            "alpha - A\nzeta - Z\nhelp - get help\nlogout - log out"
        );
    }

    #[test]
    fn test_empty_menu_lists_builtins_only() {
        let menu = CommandMenu::build(&[]).unwrap();
        assert!(menu.keyboard().rows.is_empty());
        assert_eq!(menu.command_list(), "help - get help\nlogout - log out");
    }
}
