//! Configuration of a [Store](crate::Store).

/// The level at which a [Store](crate::Store) logs the previous state,
/// the action and the next state of every
/// [dispatch()](crate::Store::dispatch()).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn log<S: AsRef<str>>(&self, message: S) {
        match self {
            LogLevel::Off => {}
            LogLevel::Trace => log::trace!("{}", message.as_ref()),
            LogLevel::Debug => log::debug!("{}", message.as_ref()),
            LogLevel::Info => log::info!("{}", message.as_ref()),
            LogLevel::Warn => log::warn!("{}", message.as_ref()),
        }
    }

    /// Whether messages at this level would currently be emitted, so
    /// that formatting can be skipped otherwise.
    pub fn enabled(&self) -> bool {
        let level = match self {
            LogLevel::Off => return false,
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
        };
        log::log_enabled!(level)
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

/// What a [Store](crate::Store) does when a listener panics during
/// [dispatch()](crate::Store::dispatch()).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerFailurePolicy {
    /// The panic unwinds through `dispatch()`, listeners after the
    /// failing one are not notified for that round.
    Propagate,
    /// The panic is caught and logged, and the remaining listeners are
    /// still notified.
    Isolate,
}

impl Default for ListenerFailurePolicy {
    fn default() -> Self {
        ListenerFailurePolicy::Propagate
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub(crate) log_level: LogLevel,
    pub(crate) listener_failures: ListenerFailurePolicy,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level at which dispatched actions and state transitions
    /// are logged.
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Set how panics in listeners are handled.
    pub fn listener_failures(mut self, policy: ListenerFailurePolicy) -> Self {
        self.listener_failures = policy;
        self
    }
}
