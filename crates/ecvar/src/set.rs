//! Set Module - The Cvar Registry and Write Policy
//!
//! [`CvarSet`] is the injected context owning every registered cvar, the
//! game-state and network-arbitration inputs the write policy reads, and
//! the notification toggles. It replaces a process-wide linked list with an
//! insertion-ordered map: O(1) lookup, iteration order still registration
//! order.
//!
//! The policy gate ([`CvarSet::set_generic`]) evaluates in a fixed order:
//! write protection, then latching, then server arbitration. Rejections are
//! outcomes, not errors: the stored value is observably unchanged and a log
//! line names the reason.

use indexmap::IndexMap;

use crate::cvar::{ChangeCallback, Cvar, CvarFlags};
use crate::error::{CvarError, Result};
use crate::value::CvarValue;

/// Coarse game state driving the latch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Console only, nothing running; writes apply immediately
    FullConsole,
    /// Early startup; writes apply immediately, callbacks usually disabled
    Startup,
    /// A level is in progress; LATCH defers
    Level,
    /// Demo playback; LATCH defers
    Demo,
}

impl GameState {
    /// States where a latched cvar may change immediately
    #[inline]
    pub fn allows_immediate_latch(self) -> bool {
        matches!(self, GameState::FullConsole | GameState::Startup)
    }
}

/// Network session inputs for SERVERINFO arbitration
#[derive(Debug, Clone, Default)]
pub struct NetArbitration {
    /// A multi-participant session is active
    pub active: bool,
    /// This process is the arbitrating host
    pub local_is_arbitrator: bool,
    /// Shown in the rejection diagnostic
    pub arbitrator_name: String,
}

/// What the policy gate did with a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value stored, notifications fired
    Applied,
    /// Deferred to the latch slot; visible after `unlatch`
    Latched,
    /// Silently dropped by write protection
    Dropped,
    /// Refused: only the arbitrator changes SERVERINFO cvars mid-session
    RejectedByArbitration,
}

/// Sink for USERINFO change broadcasts
pub type UserInfoSink = fn(name: &str, value: &CvarValue);

/// The cvar registry and policy context
pub struct CvarSet {
    /// Keyed by lowercased name; values keep the declared spelling
    vars: IndexMap<String, Cvar>,
    state: GameState,
    net: NetArbitration,
    /// NOSET writes are dropped while true
    noset_protected: bool,
    /// Change callbacks fire only when true; off during early startup
    callbacks_enabled: bool,
    userinfo_sink: Option<UserInfoSink>,
}

impl CvarSet {
    pub fn new() -> Self {
        Self {
            vars: IndexMap::new(),
            state: GameState::FullConsole,
            net: NetArbitration::default(),
            noset_protected: true,
            callbacks_enabled: false,
            userinfo_sink: None,
        }
    }

    /// Register a cvar with a typed default.
    ///
    /// An existing AUTO placeholder of the same name is absorbed: its value
    /// (typically loaded from a config file before the code registering the
    /// real cvar ran) is applied over the declared default.
    ///
    /// # Returns
    /// * `Ok(())` - registered
    /// * `Err(CvarError::AlreadyExists)` - a non-placeholder cvar owns the name
    pub fn register(
        &mut self,
        name: &str,
        default: CvarValue,
        flags: CvarFlags,
        callback: Option<ChangeCallback>,
    ) -> Result<()> {
        let cvar = Cvar::new(name, default, flags, callback);
        self.install(name, cvar)
    }

    /// Register a color cvar (packed RGB in an Int, string writes parsed
    /// through the color grammar)
    pub fn register_color(
        &mut self,
        name: &str,
        default_rgb: u32,
        flags: CvarFlags,
        callback: Option<ChangeCallback>,
    ) -> Result<()> {
        let cvar = Cvar::new_color(name, default_rgb as i32, flags, callback);
        self.install(name, cvar)
    }

    fn install(&mut self, name: &str, mut cvar: Cvar) -> Result<()> {
        let key = name.to_ascii_lowercase();
        if let Some(existing) = self.vars.get(&key) {
            if !existing.flags().contains(CvarFlags::AUTO) {
                return Err(CvarError::AlreadyExists(name.to_string()));
            }
            // Absorb the placeholder's pending user value.
            let pending = existing.value().clone();
            let coerced = cvar.coerce_incoming(&pending)?;
            if &coerced != cvar.default_value() {
                cvar.apply(coerced);
            }
        }
        self.vars.insert(key, cvar);
        Ok(())
    }

    /// Case-insensitive lookup
    pub fn find(&self, name: &str) -> Option<&Cvar> {
        self.vars.get(&name.to_ascii_lowercase())
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Cvar> {
        self.vars
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| CvarError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&Cvar> {
        self.find(name)
            .ok_or_else(|| CvarError::NotFound(name.to_string()))
    }

    /// Registration-ordered iteration
    pub fn iter(&self) -> impl Iterator<Item = &Cvar> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The policy gate. Evaluation order: NOSET, LATCH, SERVERINFO, apply.
    ///
    /// # Returns
    /// * `Ok(SetOutcome)` - what happened; the value changed only on `Applied`
    /// * `Err(CvarError::NotFound)` - unknown name
    /// * `Err(CvarError::BadColor)` - color cvar fed an unparseable string
    pub fn set_generic(&mut self, name: &str, value: CvarValue) -> Result<SetOutcome> {
        let state = self.state;
        let net = self.net.clone();
        let noset_protected = self.noset_protected;

        let cvar = self.find_mut(name)?;
        let flags = cvar.flags();

        if flags.contains(CvarFlags::NOSET) && noset_protected {
            log::debug!("write to protected cvar {} dropped", cvar.name());
            return Ok(SetOutcome::Dropped);
        }
        if flags.contains(CvarFlags::LATCH) && !state.allows_immediate_latch() {
            let coerced = cvar.coerce_incoming(&value)?;
            cvar.set_latched(Some(coerced));
            log::debug!("cvar {} latched until the next game restart", cvar.name());
            return Ok(SetOutcome::Latched);
        }
        if flags.contains(CvarFlags::SERVERINFO) && net.active && !net.local_is_arbitrator {
            log::info!(
                "only {} can change {} during a net game",
                net.arbitrator_name,
                cvar.name()
            );
            return Ok(SetOutcome::RejectedByArbitration);
        }

        self.force_set(name, value)?;
        Ok(SetOutcome::Applied)
    }

    /// Unconditional apply, bypassing all policy.
    ///
    /// Clears the default bit, fires the user-info sink for USERINFO cvars,
    /// and invokes the change callback when callbacks are enabled.
    pub fn force_set(&mut self, name: &str, value: CvarValue) -> Result<()> {
        let callbacks_enabled = self.callbacks_enabled;
        let sink = self.userinfo_sink;

        let cvar = self.find_mut(name)?;
        let coerced = cvar.coerce_incoming(&value)?;
        cvar.apply(coerced);

        let flags = cvar.flags();
        let cvar_name = cvar.name().to_string();
        let stored = cvar.value().clone();
        let callback = cvar.callback();

        if flags.contains(CvarFlags::USERINFO) {
            if let Some(sink) = sink {
                sink(&cvar_name, &stored);
            }
        }
        if callbacks_enabled {
            if let Some(cb) = callback {
                cb(&cvar_name, &stored);
            }
        }
        Ok(())
    }

    /// Apply every pending latched value. Called at a qualifying game-state
    /// transition (back to full console, or a game restart).
    pub fn unlatch(&mut self) {
        let pending: Vec<(String, CvarValue)> = self
            .vars
            .values_mut()
            .filter_map(|c| c.take_latched().map(|v| (c.name().to_string(), v)))
            .collect();
        for (name, value) in pending {
            // The cvar existed a moment ago; a failure here is a color
            // coercion bug worth hearing about, not worth aborting over.
            if let Err(err) = self.force_set(&name, value) {
                log::error!("failed to unlatch {name}: {err}");
            }
        }
    }

    /// Restore the registered default unless already at it
    pub fn reset_to_default(&mut self, name: &str) -> Result<()> {
        let cvar = self.find_mut(name)?;
        if !cvar.is_default() {
            cvar.restore_default();
        }
        Ok(())
    }

    /// Remove a cvar. Only UNSETTABLE or AUTO cvars may go.
    pub fn unset(&mut self, name: &str) -> Result<()> {
        let key = name.to_ascii_lowercase();
        let Some(cvar) = self.vars.get(&key) else {
            return Err(CvarError::NotFound(name.to_string()));
        };
        if !cvar
            .flags()
            .intersects(CvarFlags::UNSETTABLE | CvarFlags::AUTO)
        {
            return Err(CvarError::NotUnsettable(name.to_string()));
        }
        self.vars.shift_remove(&key);
        Ok(())
    }

    /// Create an AUTO placeholder holding a string value (config load or
    /// net sync met an unknown name). No-op if the name is taken.
    pub(crate) fn create_placeholder(&mut self, name: &str, value: &str, extra: CvarFlags) {
        let key = name.to_ascii_lowercase();
        if self.vars.contains_key(&key) {
            return;
        }
        let mut cvar = Cvar::new(
            name,
            CvarValue::String(String::new()),
            CvarFlags::AUTO | CvarFlags::UNSETTABLE | extra,
            None,
        );
        cvar.apply(CvarValue::String(value.to_string()));
        self.vars.insert(key, cvar);
    }

    // Policy context inputs

    #[inline]
    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn set_game_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn set_net(&mut self, net: NetArbitration) {
        self.net = net;
    }

    pub fn set_noset_protected(&mut self, protected: bool) {
        self.noset_protected = protected;
    }

    /// Enable change callbacks once dependent systems exist
    pub fn enable_callbacks(&mut self, enabled: bool) {
        self.callbacks_enabled = enabled;
    }

    pub fn set_userinfo_sink(&mut self, sink: Option<UserInfoSink>) {
        self.userinfo_sink = sink;
    }

    pub(crate) fn vars_mut(&mut self) -> impl Iterator<Item = &mut Cvar> {
        self.vars.values_mut()
    }
}

impl Default for CvarSet {
    fn default() -> Self {
        Self::new()
    }
}
