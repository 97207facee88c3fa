//! Mode handler functions and table builder.
//!
//! Each mode is three plain `fn` pointers.  Handlers never touch hardware:
//! they read the [`CircuitContext`] inputs and write `intent` / `relax`.
//!
//! ```text
//!  OFF ──[desired ∧ can start]──▶ STARTING ──[Tcmp > cool]──▶ COOLING
//!   ▲                               │                        │    ▲
//!   │                        [starting_max]        [Tcmp < cool]  [Tcmp > cool]
//!   │                               ▼                        ▼    │
//!   │                           FIN_HEATING ◀──────────────────────┘
//!   │                               │
//!   │                      [Tcnd cold for long]
//!   │                               ▼
//!   │                            DEFROST ──[program done]──▶ STARTING
//!   │
//!   ├──[¬desired ∧ can stop]── STARTING / COOLING / FIN_HEATING
//!   └──[cool-down done]─────── OVERHEAT
//!
//!  Any running mode ──[Tcmp > ceiling]──▶ OVERHEAT
//! ```

use log::{info, warn};

use super::context::{CircuitContext, ColdStreak};
use super::{CircuitMode, ModeDescriptor};
use crate::actuators::Intent;
use crate::config::DefrostTrigger;
use crate::safety::Relax;
use crate::sensors::UNKNOWN_TEMP;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the mode table.  Called once per circuit at startup.
pub fn build_mode_table() -> [ModeDescriptor; CircuitMode::COUNT] {
    [
        ModeDescriptor {
            id: CircuitMode::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        ModeDescriptor {
            id: CircuitMode::Starting,
            name: "Starting",
            on_enter: Some(starting_enter),
            on_exit: None,
            on_update: starting_update,
        },
        ModeDescriptor {
            id: CircuitMode::Cooling,
            name: "Cooling",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: cooling_update,
        },
        ModeDescriptor {
            id: CircuitMode::FinHeating,
            name: "FinHeating",
            on_enter: Some(fin_heating_enter),
            on_exit: None,
            on_update: fin_heating_update,
        },
        ModeDescriptor {
            id: CircuitMode::Defrost,
            name: "Defrost",
            on_enter: Some(defrost_enter),
            on_exit: Some(defrost_exit),
            on_update: defrost_update,
        },
        ModeDescriptor {
            id: CircuitMode::OverheatProtection,
            name: "OverheatProtection",
            on_enter: Some(overheat_enter),
            on_exit: Some(overheat_exit),
            on_update: overheat_update,
        },
    ]
}

/// Every mode change a single tick may make.
pub fn is_legal_transition(from: CircuitMode, to: CircuitMode) -> bool {
    use CircuitMode::{Cooling, Defrost, FinHeating, Off, OverheatProtection, Starting};
    matches!(
        (from, to),
        (Off, Starting)
            | (Starting, Cooling | FinHeating | OverheatProtection | Off)
            | (Cooling, FinHeating | OverheatProtection | Off)
            | (FinHeating, Cooling | Defrost | OverheatProtection | Off)
            | (Defrost, Starting | OverheatProtection)
            | (OverheatProtection, Off)
    )
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared checks
// ═══════════════════════════════════════════════════════════════════════════

/// Checks common to Starting, Cooling and FinHeating, in priority order.
fn running_exit_check(ctx: &CircuitContext) -> Option<CircuitMode> {
    if ctx.overheated() {
        return Some(CircuitMode::OverheatProtection);
    }
    if ctx.should_stop() {
        return Some(CircuitMode::Off);
    }
    None
}

fn set_running(ctx: &mut CircuitContext) {
    ctx.intent = ctx.running_intent();
    ctx.relax = Relax {
        skip_off_dwell: ctx.rapid_restart,
        immediate_off: ctx.on_battery,
    };
}

/// Extend a cold streak by this cycle's condenser reading.  Any reading at
/// or above the threshold, or an unknown one, starts it over.
fn count_cold(streak: u32, condenser: f32, trigger: DefrostTrigger) -> u32 {
    if condenser != UNKNOWN_TEMP && condenser < trigger.below {
        streak.saturating_add(1)
    } else {
        0
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut CircuitContext) {
    ctx.rapid_restart = false;
    off_intent(ctx);
}

/// Compressor and fan off; the valve follows the arbiter so it can settle
/// in the running position before a start.
fn off_intent(ctx: &mut CircuitContext) {
    ctx.intent = Intent {
        compressor: false,
        fan: false,
        valve: ctx.desired_intent.valve,
    };
    ctx.relax = Relax {
        skip_off_dwell: false,
        immediate_off: ctx.on_battery,
    };
}

fn off_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    off_intent(ctx);
    if ctx.desired && ctx.can_start {
        return Some(CircuitMode::Starting);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STARTING: compressor on, waiting for it to warm up
// ═══════════════════════════════════════════════════════════════════════════

fn starting_enter(ctx: &mut CircuitContext) {
    set_running(ctx);
    info!(
        "INFO: {} starting, compressor at {:.1}",
        ctx.circuit, ctx.compressor_temp
    );
}

fn starting_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    if ctx.compressor_on {
        ctx.rapid_restart = false;
    }
    set_running(ctx);
    if let Some(next) = running_exit_check(ctx) {
        return Some(next);
    }
    if ctx.compressor_temp > ctx.config.cooling_threshold {
        return Some(CircuitMode::Cooling);
    }
    if ctx.ticks_in_mode >= u64::from(ctx.config.starting_max) {
        return Some(CircuitMode::FinHeating);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLING / FIN_HEATING
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut CircuitContext) {
    set_running(ctx);
}

fn cooling_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    set_running(ctx);
    if let Some(next) = running_exit_check(ctx) {
        return Some(next);
    }
    if ctx.ticks_in_mode >= u64::from(ctx.config.mode_min_dwell)
        && ctx.compressor_temp < ctx.config.cooling_threshold
    {
        return Some(CircuitMode::FinHeating);
    }
    None
}

fn fin_heating_enter(ctx: &mut CircuitContext) {
    ctx.cold_streak = ColdStreak::default();
    set_running(ctx);
}

fn fin_heating_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    set_running(ctx);
    let (deep, mild) = (ctx.config.defrost_deep, ctx.config.defrost_mild);
    ctx.cold_streak = ColdStreak {
        deep: count_cold(ctx.cold_streak.deep, ctx.condenser_temp, deep),
        mild: count_cold(ctx.cold_streak.mild, ctx.condenser_temp, mild),
    };
    if let Some(next) = running_exit_check(ctx) {
        return Some(next);
    }
    if ctx.ticks_in_mode >= u64::from(ctx.config.mode_min_dwell)
        && ctx.compressor_temp > ctx.config.cooling_threshold
    {
        return Some(CircuitMode::Cooling);
    }
    let streak = ctx.cold_streak;
    if streak.deep >= deep.after || streak.mild >= mild.after {
        info!(
            "INFO: {} condenser at {:.1}, cold for {} cycles, defrosting",
            ctx.circuit,
            ctx.condenser_temp,
            streak.deep.max(streak.mild)
        );
        return Some(CircuitMode::Defrost);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DEFROST: fixed program, always runs to completion
// ═══════════════════════════════════════════════════════════════════════════

fn defrost_intent(ctx: &mut CircuitContext) {
    let window = ctx
        .defrost
        .intent(&ctx.config.defrost_program)
        .unwrap_or(Intent::OFF);
    ctx.intent = if ctx.on_battery { window.shed() } else { window };
    ctx.relax = Relax {
        skip_off_dwell: true,
        immediate_off: true,
    };
}

fn defrost_enter(ctx: &mut CircuitContext) {
    ctx.defrost.reset();
    defrost_intent(ctx);
}

fn defrost_exit(ctx: &mut CircuitContext) {
    ctx.defrost.reset();
}

fn defrost_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    if ctx.overheated() {
        return Some(CircuitMode::OverheatProtection);
    }
    if !ctx.defrost.advance(&ctx.config.defrost_program) {
        info!("INFO: {} defrost complete, restarting", ctx.circuit);
        ctx.rapid_restart = true;
        return Some(CircuitMode::Starting);
    }
    defrost_intent(ctx);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OVERHEAT_PROTECTION: compressor and fan shed until cooled down
// ═══════════════════════════════════════════════════════════════════════════

fn overheat_intent(ctx: &mut CircuitContext) {
    ctx.intent = Intent {
        compressor: false,
        fan: false,
        valve: ctx.intent.valve,
    };
    ctx.relax = Relax {
        skip_off_dwell: false,
        immediate_off: true,
    };
}

fn overheat_enter(ctx: &mut CircuitContext) {
    ctx.rapid_restart = false;
    overheat_intent(ctx);
    warn!(
        "ALARM: {} compressor at {:.1} above {:.1}, shutting down",
        ctx.circuit, ctx.compressor_temp, ctx.config.overheat_ceiling
    );
}

fn overheat_exit(ctx: &mut CircuitContext) {
    info!("INFO: {} compressor cooled down", ctx.circuit);
}

fn overheat_update(ctx: &mut CircuitContext) -> Option<CircuitMode> {
    overheat_intent(ctx);
    if !ctx.compressor_on && ctx.compressor_dwell >= ctx.config.overheat_cooldown {
        return Some(CircuitMode::Off);
    }
    None
}
