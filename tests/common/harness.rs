// ServerTestHarness - a window server wired to scripted dialogs and a temp dir

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tempfile::TempDir;
use tessera::app::WindowServer;
use tessera::config::Config;
use tessera::model::ids::{PaneId, ViewId};
use tessera::services::dialogs::{
    BatchChoice, Dialogs, FileChange, FileChangeChoice, SaveChoice,
};
use tessera::services::fs::LocalFileSystem;

/// One prepared answer to a dialog query
#[derive(Debug, Clone)]
pub enum Answer {
    Save(SaveChoice),
    Batch(BatchChoice),
    Create(bool),
    MoveHere(bool),
    FileChanged(FileChangeChoice),
    SavePath(Option<PathBuf>),
}

#[derive(Debug, Default)]
pub struct DialogScript {
    answers: VecDeque<Answer>,
    /// Every query asked, in order, e.g. `confirm_save(Untitled 1)`
    pub asked: Vec<String>,
    /// Every message passed to `report`
    pub reports: Vec<String>,
}

impl DialogScript {
    fn next(&mut self, query: String) -> Answer {
        let answer = self
            .answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer for {}", query));
        self.asked.push(query);
        answer
    }
}

/// Dialogs that answer from a script and panic on anything unexpected
pub struct ScriptedDialogs(Rc<RefCell<DialogScript>>);

impl Dialogs for ScriptedDialogs {
    fn confirm_save(&mut self, name: &str) -> SaveChoice {
        match self.0.borrow_mut().next(format!("confirm_save({})", name)) {
            Answer::Save(choice) => choice,
            other => panic!("confirm_save({}) got {:?}", name, other),
        }
    }

    fn confirm_batch(&mut self, names: &[String]) -> BatchChoice {
        match self.0.borrow_mut().next(format!("confirm_batch({})", names.join(", "))) {
            Answer::Batch(choice) => choice,
            other => panic!("confirm_batch({:?}) got {:?}", names, other),
        }
    }

    fn confirm_create(&mut self, path: &Path) -> bool {
        match self.0.borrow_mut().next(format!("confirm_create({})", path.display())) {
            Answer::Create(yes) => yes,
            other => panic!("confirm_create({}) got {:?}", path.display(), other),
        }
    }

    fn confirm_move_here(&mut self, path: &Path) -> bool {
        match self.0.borrow_mut().next(format!("confirm_move_here({})", path.display())) {
            Answer::MoveHere(yes) => yes,
            other => panic!("confirm_move_here({}) got {:?}", path.display(), other),
        }
    }

    fn file_changed(&mut self, name: &str, change: FileChange) -> FileChangeChoice {
        match self
            .0
            .borrow_mut()
            .next(format!("file_changed({}, {:?})", name, change))
        {
            Answer::FileChanged(choice) => choice,
            other => panic!("file_changed({}) got {:?}", name, other),
        }
    }

    fn ask_save_path(&mut self, name: &str) -> Option<PathBuf> {
        match self.0.borrow_mut().next(format!("ask_save_path({})", name)) {
            Answer::SavePath(path) => path,
            other => panic!("ask_save_path({}) got {:?}", name, other),
        }
    }

    fn report(&mut self, message: &str) {
        self.0.borrow_mut().reports.push(message.to_string());
    }
}

pub struct ServerTestHarness {
    pub server: WindowServer,
    script: Rc<RefCell<DialogScript>>,
    dir: PathBuf,
    _temp_dir: TempDir,
}

impl ServerTestHarness {
    /// Server with background workers disabled; tests drive polling by hand
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().canonicalize().unwrap();

        let mut config = Config::default();
        config.autosave.enabled = false;
        config.autosave.scratch_dir = Some(dir.join(".autosave"));
        config.file_check.enabled = false;
        adjust(&mut config);

        let script = Rc::new(RefCell::new(DialogScript::default()));
        let mut server = WindowServer::new(
            config,
            Box::new(ScriptedDialogs(Rc::clone(&script))),
            Arc::new(LocalFileSystem::new()),
        );
        server.set_working_dir(dir.clone());

        Self {
            server,
            script,
            dir,
            _temp_dir: temp_dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write a file into the temp dir and return its canonical path
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    pub fn answer(&self, answer: Answer) {
        self.script.borrow_mut().answers.push_back(answer);
    }

    pub fn asked(&self) -> Vec<String> {
        self.script.borrow().asked.clone()
    }

    pub fn reports(&self) -> Vec<String> {
        self.script.borrow().reports.clone()
    }

    pub fn assert_all_answers_used(&self) {
        let remaining = self.script.borrow().answers.len();
        assert_eq!(remaining, 0, "{} scripted answers never asked for", remaining);
    }

    pub fn assert_invariants(&self) {
        if let Err(e) = self.server.check_invariants() {
            panic!("invariant violated: {}", e);
        }
    }

    pub fn active_view(&self) -> ViewId {
        self.server.active_view().expect("an active view")
    }

    pub fn active_pane(&self) -> PaneId {
        self.server.active_pane().expect("an active pane")
    }

    /// Compact layout of the active view, e.g. `H[1 V[2 3]]`
    pub fn layout(&self) -> String {
        self.server
            .layout_of(self.active_view())
            .map(|l| l.to_string())
            .unwrap_or_default()
    }

    pub fn layout_of(&self, view: ViewId) -> String {
        self.server
            .layout_of(view)
            .map(|l| l.to_string())
            .unwrap_or_default()
    }
}
