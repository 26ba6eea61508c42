#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;

use covgate::command::{CommandOutput, CommandRunner};
use covgate::github::{Comment, CommentStore};

/// Replays canned output per program and records every invocation.
/// Programs without a script fail to launch, like a missing binary.
#[derive(Default)]
pub struct FakeRunner {
    scripts: HashMap<String, Result<CommandOutput, String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: &str, output: CommandOutput) -> Self {
        self.scripts.insert(program.to_string(), Ok(output));
        self
    }

    pub fn with_launch_error(mut self, program: &str, message: &str) -> Self {
        self.scripts
            .insert(program.to_string(), Err(message.to_string()));
        self
    }

    /// Every invocation as `program arg1 arg2 ...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn was_called(&self, program: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c.split(' ').next() == Some(program))
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let mut call = program.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        self.calls.borrow_mut().push(call);

        match self.scripts.get(program) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(io::Error::new(io::ErrorKind::Other, message.clone())),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: command not found"),
            )),
        }
    }
}

/// In-memory pull request comment thread.
#[derive(Default)]
pub struct MemoryStore {
    comments: RefCell<Vec<Comment>>,
    next_id: Cell<u64>,
    pub creates: Cell<usize>,
    pub updates: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.next_id.set(100);
        store
    }

    pub fn seed(&self, body: &str) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.comments.borrow_mut().push(Comment {
            id,
            body: Some(body.to_string()),
        });
        id
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments.borrow().clone()
    }

    pub fn body(&self, id: u64) -> Option<String> {
        self.comments
            .borrow()
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.body.clone())
    }
}

impl CommentStore for MemoryStore {
    fn list_comments(&self) -> anyhow::Result<Vec<Comment>> {
        Ok(self.comments())
    }

    fn create_comment(&self, body: &str) -> anyhow::Result<u64> {
        self.creates.set(self.creates.get() + 1);
        Ok(self.seed(body))
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> anyhow::Result<()> {
        self.updates.set(self.updates.get() + 1);
        let mut comments = self.comments.borrow_mut();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| anyhow::anyhow!("no comment {comment_id}"))?;
        comment.body = Some(body.to_string());
        Ok(())
    }
}

pub fn lcov_summary(percent: &str) -> CommandOutput {
    CommandOutput::success(format!(
        "Reading tracefile lcov.info\nSummary coverage rate:\n  lines......: {percent}% (171 of 200 lines)\n  functions..: 90.0% (18 of 20 functions)\n"
    ))
}

pub fn diff_cover_report(percent: &str) -> String {
    format!(
        "-------------\nDiff Coverage\nDiff: origin/main...HEAD, staged and unstaged changes\n-------------\nsrc/parser.rs (80.0%): Missing lines 12,14\n-------------\nTotal:   10 lines\nMissing: 2 lines\nDiff Coverage: {percent}%\n-------------\n"
    )
}
