//! 進捗と結果サマリーの出力

use crate::model::{ProcessOutput, TAIL_LINES};
use colored::Colorize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// 進捗を出力する間隔（ユニット数）
pub const PROGRESS_INTERVAL: usize = 5;

/// `index`（1始まり）番目のユニット処理後に進捗を出力するか
pub fn should_report(index: usize, total: usize) -> bool {
    index % PROGRESS_INTERVAL == 0 || index == total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Push,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Build => f.write_str("BUILD"),
            Step::Push => f.write_str("PUSH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub index: usize,
    pub total: usize,
    pub built: usize,
    pub pushed: usize,
    pub elapsed: Duration,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress {}/{} | built={} pushed={} | elapsed={}s",
            self.index,
            self.total,
            self.built,
            self.pushed,
            self.elapsed.as_secs()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Build,
    Push,
    /// 想定外のエラーでユニットの処理が打ち切られた
    Aborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Build => f.write_str("build"),
            FailureKind::Push => f.write_str("push"),
            FailureKind::Aborted => f.write_str("aborted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub kind: FailureKind,
    pub message: String,
}

/// バッチ全体の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub built: usize,
    pub pushed: usize,
    pub push_skipped: usize,
    pub elapsed: Duration,
    pub registry: String,
    pub failures: Vec<UnitFailure>,
}

impl BatchSummary {
    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// 失敗が記録されたユニットの数（ビルドとプッシュの両方の失敗も1件）
    pub fn failed_units(&self) -> usize {
        self.failures
            .iter()
            .map(|f| f.unit.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// ビルド失敗・プッシュ失敗・打ち切りが1件もないか
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DONE | total={} built={} pushed={} | elapsed={}s | registry={}",
            self.total,
            self.built,
            self.pushed,
            self.elapsed.as_secs(),
            self.registry
        )
    }
}

/// 実行ループからの出力先
pub trait Reporter {
    fn start(&mut self, total: usize);
    fn progress(&mut self, line: &ProgressLine);
    fn output_tail(&mut self, step: Step, unit_tag: &str, output: &ProcessOutput);
    fn summary(&mut self, summary: &BatchSummary);
}

/// 標準出力へのテキスト出力
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn start(&mut self, total: usize) {
        println!("{} Total units to build/push: {}", "[shipflow]".blue(), total);
    }

    fn progress(&mut self, line: &ProgressLine) {
        println!("{} {}", "[shipflow]".blue(), line);
    }

    fn output_tail(&mut self, step: Step, unit_tag: &str, output: &ProcessOutput) {
        println!(
            "{} {} STDOUT tail for {}:\n{}",
            "[shipflow]".blue(),
            step,
            unit_tag.cyan(),
            output.stdout_tail(TAIL_LINES)
        );
        println!(
            "{} {} STDERR tail for {}:\n{}",
            "[shipflow]".blue(),
            step,
            unit_tag.cyan(),
            output.stderr_tail(TAIL_LINES)
        );
    }

    fn summary(&mut self, summary: &BatchSummary) {
        let line = summary.to_string();
        if summary.is_success() {
            println!("{} {}", "[shipflow]".blue(), line.green().bold());
        } else {
            println!("{} {}", "[shipflow]".blue(), line.yellow().bold());
            for failure in &summary.failures {
                println!(
                    "  {} {} ({}): {}",
                    "✗".red().bold(),
                    failure.unit,
                    failure.kind,
                    failure.message
                );
            }
        }
    }
}
