use std::fmt;

/// 失敗時に表示する出力の行数
pub const TAIL_LINES: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildStatus {
    #[default]
    Unstarted,
    Built,
    NothingChanged,
    Failed,
}

impl BuildStatus {
    /// `built` カウンタの対象となるステータスか
    pub fn is_success(self) -> bool {
        matches!(self, BuildStatus::Built | BuildStatus::NothingChanged)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Unstarted => "unstarted",
            BuildStatus::Built => "built",
            BuildStatus::NothingChanged => "nothing_changed",
            BuildStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushStatus {
    #[default]
    Unstarted,
    Pushed,
    /// local-only、プッシュ無効、または変更なしでプッシュを省略
    Skipped,
    Failed,
}

impl fmt::Display for PushStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PushStatus::Unstarted => "unstarted",
            PushStatus::Pushed => "pushed",
            PushStatus::Skipped => "skipped",
            PushStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// 外部プロセス（ビルド・プッシュ）の出力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn stdout_tail(&self, lines: usize) -> String {
        tail(&self.stdout, lines)
    }

    pub fn stderr_tail(&self, lines: usize) -> String {
        tail(&self.stderr, lines)
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// ビルド・プッシュで発生した問題
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    pub output: Option<ProcessOutput>,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: ProcessOutput) -> Self {
        self.output = Some(output);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last_lines() {
        let stdout: String = (1..=100).map(|i| format!("line {}\n", i)).collect();
        let output = ProcessOutput::new(stdout, "");

        let tail = output.stdout_tail(TAIL_LINES);
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), 60);
        assert_eq!(lines[0], "line 41");
        assert_eq!(lines[59], "line 100");
    }

    #[test]
    fn test_tail_shorter_than_limit() {
        let output = ProcessOutput::new("", "error: a\nerror: b");
        assert_eq!(output.stderr_tail(TAIL_LINES), "error: a\nerror: b");
        assert_eq!(output.stdout_tail(TAIL_LINES), "");
    }

    #[test]
    fn test_build_status_success() {
        assert!(BuildStatus::Built.is_success());
        assert!(BuildStatus::NothingChanged.is_success());
        assert!(!BuildStatus::Failed.is_success());
        assert!(!BuildStatus::Unstarted.is_success());
    }
}
