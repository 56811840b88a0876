use std::fs;

/// One live process and its full command line.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub pid:     u32,
    pub cmdline: String,
}

impl ProcessEntry {
    /// Marker must appear in the command line; scope too, when given.
    pub fn matches(&self, marker: &str, scope: Option<&str>) -> bool {
        self.cmdline.contains(marker) && scope.map_or(true, |s| self.cmdline.contains(s))
    }
}

/// Read /proc/<pid>/cmdline for every process we can access.
/// Kernel threads and processes that vanish mid-scan are skipped.
pub fn read_all() -> Vec<ProcessEntry> {
    let mut out = Vec::new();

    let dir = match fs::read_dir("/proc") {
        Ok(d) => d,
        Err(_) => return out,
    };

    for entry in dir.flatten() {
        let name = entry.file_name();
        let pid: u32 = match name.to_string_lossy().parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let raw = match fs::read(format!("/proc/{}/cmdline", pid)) {
            Ok(r) => r,
            Err(_) => continue,  // permission denied or process gone
        };
        if raw.is_empty() { continue; }

        out.push(ProcessEntry { pid, cmdline: join_cmdline(&raw) });
    }
    out
}

/// PIDs whose command line matches, excluding the calling process.
/// The table can change between this scan and any signal sent to the result.
pub fn find(marker: &str, scope: Option<&str>) -> Vec<u32> {
    let me = std::process::id();
    let mut pids: Vec<u32> = read_all()
        .into_iter()
        .filter(|p| p.pid != me && p.matches(marker, scope))
        .map(|p| p.pid)
        .collect();
    pids.sort_unstable();
    pids
}

/// NUL-separated argv to a single space-joined string.
fn join_cmdline(raw: &[u8]) -> String {
    raw.split(|b| *b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s))
        .collect::<Vec<_>>()
        .join(" ")
}
