use enum_dispatch::enum_dispatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str_lowercase(&self) -> &'static str {
        match self {
            &Self::Debug => "debug",
            &Self::Info => "info",
            &Self::Warn => "warn",
        }
    }

    /// `-v` count of the command line to the lowest level that is still printed.
    pub fn from_verbosity(occurrences: u64) -> LogLevel {
        match occurrences {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

#[enum_dispatch]
pub trait SolverLog {
    fn enabled(&self, level: LogLevel) -> bool;

    fn log(&mut self, level: LogLevel, message: &str);
}

/// Drops everything.
#[derive(Debug, Clone, Default)]
pub struct SilentLog {}

impl SolverLog for SilentLog {
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn log(&mut self, _level: LogLevel, _message: &str) {}
}

#[derive(Debug, Clone)]
pub struct ConsoleLog {
    pub min_level: LogLevel,
}

impl SolverLog for ConsoleLog {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            println!("[{}] {}", level.as_str_lowercase(), message);
        }
    }
}

/// Keeps all messages, mostly useful in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    pub messages: Vec<(LogLevel, String)>,
}

impl SolverLog for RecordingLog {
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        self.messages.push((level, message.to_string()));
    }
}

#[enum_dispatch(SolverLog)]
#[derive(Debug, Clone)]
pub enum LogSink {
    SilentLog(SilentLog),
    ConsoleLog(ConsoleLog),
    RecordingLog(RecordingLog),
}

impl Default for LogSink {
    fn default() -> Self {
        SilentLog {}.into()
    }
}

impl LogSink {
    pub fn console(min_level: LogLevel) -> Self {
        ConsoleLog { min_level }.into()
    }

    pub fn recording() -> Self {
        RecordingLog::default().into()
    }

    /// Messages are only formatted if the sink wants them.
    pub fn emit(&mut self, level: LogLevel, message: impl FnOnce() -> String) {
        if self.enabled(level) {
            let message = message();
            self.log(level, &message);
        }
    }

    pub fn debug(&mut self, message: impl FnOnce() -> String) {
        self.emit(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl FnOnce() -> String) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl FnOnce() -> String) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn recorded(&self) -> &[(LogLevel, String)] {
        match self {
            LogSink::RecordingLog(log) => &log.messages,
            _ => &[],
        }
    }
}
