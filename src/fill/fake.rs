//! Scripted [`Channel`] for exercising the fill logic without touching the host.

use crate::channel::{kill_result, Channel, CommandOutput};
use crate::error::{FillError, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct FakeChannel {
    available: HashSet<String>,
    replies:   RefCell<HashMap<String, VecDeque<CommandOutput>>>,
    processes: HashMap<String, Vec<u32>>,
    fail_spawn: bool,
    fail_kill:  Option<u32>,

    pub runs:    RefCell<Vec<(String, Vec<String>)>>,
    pub killed:  RefCell<Vec<Vec<u32>>>,
    pub spawned: RefCell<Vec<(String, Vec<String>, Option<PathBuf>)>>,
}

impl FakeChannel {
    pub fn new() -> Self { Self::default() }

    pub fn with_tool(mut self, program: &str) -> Self {
        self.available.insert(program.to_string());
        self
    }

    /// Queue the next reply for `program`; unscripted runs succeed silently.
    pub fn reply(self, program: &str, out: CommandOutput) -> Self {
        self.replies.borrow_mut().entry(program.to_string()).or_default().push_back(out);
        self
    }

    pub fn with_processes(mut self, marker: &str, pids: &[u32]) -> Self {
        self.processes.insert(marker.to_string(), pids.to_vec());
        self
    }

    pub fn failing_spawns(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// Make the kill of `pid` fail the way a refused signal does.
    pub fn failing_kill_of(mut self, pid: u32) -> Self {
        self.fail_kill = Some(pid);
        self
    }

    pub fn ran(&self, program: &str) -> Vec<Vec<String>> {
        self.runs.borrow().iter()
            .filter(|(p, _)| p == program)
            .map(|(_, a)| a.clone())
            .collect()
    }
}

impl Channel for FakeChannel {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.runs.borrow_mut().push((program.to_string(), args.to_vec()));
        let next = self.replies.borrow_mut().get_mut(program).and_then(|q| q.pop_front());
        Ok(next.unwrap_or_else(|| CommandOutput::ok("")))
    }

    fn is_command_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }

    fn spawn_detached(&self, program: &str, args: &[String], log: Option<&Path>) -> Result<()> {
        if self.fail_spawn {
            return Err(FillError::ToolUnavailable(program.to_string()));
        }
        self.spawned.borrow_mut().push((program.to_string(), args.to_vec(), log.map(Path::to_path_buf)));
        Ok(())
    }

    fn find_processes(&self, marker: &str, _scope: Option<&str>) -> Vec<u32> {
        self.processes.get(marker).cloned().unwrap_or_default()
    }

    fn kill(&self, pids: &[u32]) -> Result<()> {
        self.killed.borrow_mut().push(pids.to_vec());
        match self.fail_kill {
            Some(pid) if pids.contains(&pid) => {
                kill_result(pid, Err(nix::errno::Errno::EPERM))
            }
            _ => Ok(()),
        }
    }
}
