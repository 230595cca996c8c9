use std::collections::VecDeque;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::ExportError;
use crate::import::{apply_definitions, Definition, ImportOutcome, Importer};
use crate::listbox::Listbox;
use crate::ui::host::TerminalHost;
use crate::ui::theme::Theme;

/// Most recent notices kept for the status bar
const MAX_NOTICES: usize = 5;

/// Application mode - determines what UI to show and how to handle input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    /// Browsing the definition list
    Browse,
    /// Typing the path of a file to import
    Prompt { input: String },
}

/// Line shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Application state
pub struct App {
    mode: AppMode,
    listbox: Listbox<TerminalHost, Definition>,
    importer: Importer,
    theme: Theme,
    config: Config,
    notices: VecDeque<Notice>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let theme = config.theme.build();
        let listbox = Listbox::new(TerminalHost::new(), theme.clone(), config.list.selection_policy);
        let importer = Importer::from_config(&config.import);
        tracing::debug!(
            "Selection policy {:?}, import policy {:?}",
            listbox.policy(),
            config.import.policy
        );

        Self {
            mode: AppMode::Browse,
            listbox,
            importer,
            theme,
            config,
            notices: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    pub fn listbox(&self) -> &Listbox<TerminalHost, Definition> {
        &self.listbox
    }

    pub fn listbox_mut(&mut self) -> &mut Listbox<TerminalHost, Definition> {
        &mut self.listbox
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extension the import prompt accepts
    pub fn import_extension(&self) -> &str {
        self.importer.filter().extension()
    }

    /// Number of imports still running
    pub fn pending_imports(&self) -> usize {
        self.importer.pending()
    }

    /// Newest notice last
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Start importing a definitions file in the background
    pub fn import(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        match self.importer.start(&path) {
            Ok(_) => self.notify(format!("Importing {}...", path.display())),
            Err(e) => self.report(e),
        }
    }

    /// Import several files, applied in the given order
    pub fn import_all(&mut self, paths: Vec<PathBuf>) {
        let count = paths.len();
        let mut started = 0;
        for result in self.importer.start_all(paths) {
            match result {
                Ok(_) => started += 1,
                Err(e) => self.report(e),
            }
        }
        if started > 0 {
            self.notify(format!("Importing {} of {} file(s)...", started, count));
        }
    }

    /// Abort every running import
    pub fn cancel_imports(&mut self) {
        let pending = self.importer.pending();
        if pending > 0 {
            self.importer.cancel_all();
            self.notify(format!("Cancelled {} import(s)", pending));
        }
    }

    /// Apply every import that finished since the last call
    pub fn poll_imports(&mut self) {
        while let Some(outcome) = self.importer.try_next() {
            self.apply_import(outcome);
        }
    }

    /// Wait for all running imports and apply them
    #[cfg(test)]
    pub async fn finish_imports(&mut self) {
        while let Some(outcome) = self.importer.next().await {
            self.apply_import(outcome);
        }
    }

    fn apply_import(&mut self, outcome: ImportOutcome) {
        match outcome.result {
            Ok(definitions) => {
                let added = apply_definitions(&mut self.listbox, definitions);
                self.notify(format!(
                    "Imported {} definitions from {}",
                    added.len(),
                    outcome.path.display()
                ));
            }
            Err(e) => self.report(e),
        }
    }

    /// Mouse click at a terminal cell. Ignored while the prompt is open.
    pub fn click(&mut self, column: u16, row: u16) {
        if self.is_prompting() {
            return;
        }
        let Some(handle) = self.listbox.host().hit_test(column, row) else {
            return;
        };
        if let Err(e) = self.listbox.click(handle) {
            self.report(e);
        }
    }

    pub fn next(&mut self) {
        if let Err(e) = self.listbox.select_next() {
            self.report(e);
        }
    }

    pub fn previous(&mut self) {
        if let Err(e) = self.listbox.select_previous() {
            self.report(e);
        }
    }

    pub fn deselect(&mut self) {
        if let Err(e) = self.listbox.set_selection(None) {
            self.report(e);
        }
    }

    /// Remove the selected definition, if any
    pub fn remove_selected(&mut self) {
        let selection = self.listbox.selection();
        if let Err(e) = self.listbox.remove(selection) {
            self.report(e);
        }
    }

    pub fn clear(&mut self) {
        self.listbox.clear();
        self.notify("Cleared definitions".to_string());
    }

    /// Write the definitions back out. Not implemented yet.
    pub fn export(&mut self) {
        self.report(ExportError::NotImplemented);
    }

    /// Open the import path prompt
    pub fn open_prompt(&mut self) {
        self.mode = AppMode::Prompt {
            input: String::new(),
        };
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.mode, AppMode::Prompt { .. })
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let AppMode::Prompt { input } = &mut self.mode {
            input.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let AppMode::Prompt { input } = &mut self.mode {
            input.pop();
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.mode = AppMode::Browse;
    }

    /// Import the typed path and return to browsing
    pub fn submit_prompt(&mut self) {
        let mode = std::mem::replace(&mut self.mode, AppMode::Browse);
        if let AppMode::Prompt { input } = mode {
            let input = input.trim();
            if !input.is_empty() {
                let path = shellexpand::tilde(input).into_owned();
                self.import(path);
            }
        }
    }

    /// Surface an error to the user and the log
    pub fn report(&mut self, error: impl Into<anyhow::Error>) {
        let error = error.into();
        tracing::warn!("{:#}", error);
        self.push_notice(Notice {
            text: format!("{:#}", error),
            is_error: true,
        });
    }

    fn notify(&mut self, text: String) {
        tracing::info!("{}", text);
        self.push_notice(Notice {
            text,
            is_error: false,
        });
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportPolicy;
    use crate::listbox::SelectionPolicy;
    use ratatui::{buffer::Buffer, layout::Rect};

    fn last_notice(app: &App) -> Notice {
        app.notices().last().cloned().unwrap()
    }

    fn write_weapons(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("weapons.json");
        std::fs::write(&path, r#"[{"name": "Fireball"}, {"name": "IceBolt"}]"#).unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_adds_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Config::default());

        app.import(write_weapons(&dir));
        assert_eq!(app.pending_imports(), 1);
        app.finish_imports().await;

        assert_eq!(app.listbox().host().labels(), vec!["Fireball", "IceBolt"]);
        assert!(!last_notice(&app).is_error);
    }

    #[tokio::test]
    async fn test_import_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "not json").unwrap();

        let mut app = App::new(Config::default());
        app.import(dir.path().join("weapons.txt"));
        let notice = last_notice(&app);
        assert!(notice.is_error);
        assert!(notice.text.contains("is not a .json file"));

        app.import(&broken);
        app.finish_imports().await;
        let notice = last_notice(&app);
        assert!(notice.is_error);
        assert!(notice.text.starts_with("failed to decode definitions"));
        assert!(app.listbox().is_empty());
    }

    #[tokio::test]
    async fn test_interleaved_imports_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.import.policy = ImportPolicy::Interleave;
        let mut app = App::new(config);

        let path = write_weapons(&dir);
        app.import(&path);
        app.import(&path);
        app.finish_imports().await;

        assert_eq!(app.listbox().len(), 4);
    }

    #[tokio::test]
    async fn test_import_all_loads_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_weapons(&dir);
        let second = dir.path().join("armor.json");
        std::fs::write(&second, r#"[{"name": "Helmet"}]"#).unwrap();

        // Default policy is latest-wins; a batch must still load every file
        let mut app = App::new(Config::default());
        app.import_all(vec![first, dir.path().join("notes.md"), second]);
        assert!(app.notices().any(|n| n.is_error && n.text.contains("is not a .json file")));
        assert_eq!(app.pending_imports(), 2);
        app.finish_imports().await;

        assert_eq!(app.listbox().host().labels(), vec!["Fireball", "IceBolt", "Helmet"]);
    }

    #[tokio::test]
    async fn test_prompt_flow() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_weapons(&dir);
        let mut app = App::new(Config::default());

        app.open_prompt();
        assert!(app.is_prompting());
        for c in path.display().to_string().chars() {
            app.push_prompt_char(c);
        }
        app.push_prompt_char('x');
        app.pop_prompt_char();
        app.submit_prompt();

        assert_eq!(app.mode(), &AppMode::Browse);
        app.finish_imports().await;
        assert_eq!(app.listbox().len(), 2);
    }

    #[test]
    fn test_cancel_prompt() {
        let mut app = App::new(Config::default());
        app.open_prompt();
        app.push_prompt_char('a');
        app.cancel_prompt();
        assert_eq!(app.mode(), &AppMode::Browse);
        assert_eq!(app.pending_imports(), 0);
    }

    #[test]
    fn test_click_selects_row() {
        let mut app = App::new(Config::default());
        let definitions = crate::import::decode(br#"[{"name": "Sword"}, {"name": "Shield"}]"#).unwrap();
        apply_definitions(app.listbox_mut(), definitions);

        let area = Rect::new(0, 0, 10, 5);
        let theme = app.theme().clone();
        app.listbox_mut().host_mut().render(area, &mut Buffer::empty(area), &theme);

        app.click(0, 1);
        assert_eq!(app.listbox().selection(), Some(1));
        assert_eq!(app.listbox().selected().map(|d| d.name.as_str()), Some("Shield"));

        app.click(0, 4); // empty space
        assert_eq!(app.listbox().selection(), Some(1));

        app.deselect();
        assert_eq!(app.listbox().selection(), None);
    }

    #[test]
    fn test_click_ignored_while_prompting() {
        let mut app = App::new(Config::default());
        let definitions = crate::import::decode(br#"[{"name": "Sword"}, {"name": "Shield"}]"#).unwrap();
        apply_definitions(app.listbox_mut(), definitions);

        let area = Rect::new(0, 0, 10, 5);
        let theme = app.theme().clone();
        app.listbox_mut().host_mut().render(area, &mut Buffer::empty(area), &theme);

        app.open_prompt();
        app.click(0, 1);
        assert_eq!(app.listbox().selection(), None);

        app.cancel_prompt();
        app.click(0, 1);
        assert_eq!(app.listbox().selection(), Some(1));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut app = App::new(Config::default());
        let definitions = crate::import::decode(br#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        apply_definitions(app.listbox_mut(), definitions);

        app.remove_selected(); // nothing selected: no-op
        assert_eq!(app.listbox().len(), 2);

        app.next();
        app.remove_selected();
        assert_eq!(app.listbox().host().labels(), vec!["B"]);
        assert_eq!(app.listbox().selection(), None);

        app.clear();
        assert!(app.listbox().is_empty());
    }

    #[test]
    fn test_stale_selection_is_reported_on_remove() {
        let mut config = Config::default();
        config.list.selection_policy = SelectionPolicy::Preserve;
        let mut app = App::new(config);
        let definitions = crate::import::decode(br#"[{"name": "Fireball"}, {"name": "IceBolt"}]"#).unwrap();
        apply_definitions(app.listbox_mut(), definitions);

        app.listbox_mut().set_selection(Some(1)).unwrap();
        app.listbox_mut().remove(Some(0)).unwrap();
        app.remove_selected();

        let notice = last_notice(&app);
        assert!(notice.is_error);
        assert!(notice.text.contains("out of range"));
        assert_eq!(app.listbox().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_imports() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Config::default());

        app.import(write_weapons(&dir));
        app.cancel_imports();
        assert_eq!(app.pending_imports(), 0);
        assert_eq!(last_notice(&app).text, "Cancelled 1 import(s)");

        app.finish_imports().await;
        app.poll_imports();
        assert!(app.listbox().is_empty());
    }

    #[test]
    fn test_export_not_implemented() {
        let mut app = App::new(Config::default());
        app.export();
        assert_eq!(last_notice(&app).text, "export is not implemented yet");
    }

    #[test]
    fn test_notices_are_bounded() {
        let mut app = App::new(Config::default());
        for _ in 0..(MAX_NOTICES + 3) {
            app.export();
        }
        assert_eq!(app.notices().count(), MAX_NOTICES);
    }
}
