//! Frequency plan presets
//!
//! Each preset is a fixed, ordered list of `mac set` commands. EU presets
//! express duty cycle as `<dcycle> = 100 / X - 1` for a per-channel share of
//! X percent.

use crate::module::ModuleVariant;
use crate::protocol::commands::{format_command, Command, MAC_SET_RX2_EU};

/// First optional EU868 channel; channels 0 to 2 are fixed in firmware
const EU_FIRST_OPTIONAL_CHANNEL: u8 = 3;
/// Last EU868 channel configured by the presets
const EU_LAST_CHANNEL: u8 = 7;
/// Frequency of EU868 channel 3; the following channels are 200 kHz apart
const EU_CHANNEL_3_FREQ: u32 = 867_100_000;
const EU_CHANNEL_SPACING: u32 = 200_000;
/// 1% duty cycle spread over 8 channels
const DCYCLE_TTN_EU: u16 = 799;
/// 1% duty cycle spread over the 3 default channels
const DCYCLE_DEFAULT_EU: u16 = 299;

/// US915 has 64 125 kHz channels and 8 500 kHz channels
const US_CHANNEL_COUNT: u8 = 72;
/// TTN uses sub-band 2 (channels 8 to 15) plus 500 kHz channel 65
const US_TTN_SUB_BAND: core::ops::RangeInclusive<u8> = 8..=15;
const US_TTN_WIDE_CHANNEL: u8 = 65;

/// Named channel configuration
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyPlan {
    /// EU868 for a single-channel gateway on channel 0
    SingleChannelEu,
    /// EU868 as used by The Things Network (8 channels)
    TtnEu,
    /// US915 as used by The Things Network (sub-band 2)
    TtnUs,
    /// EU868 with only the three default channels
    DefaultEu,
}

impl FrequencyPlan {
    /// Whether the plan applies to the given module
    pub fn supports(&self, variant: ModuleVariant) -> bool {
        match self {
            FrequencyPlan::SingleChannelEu | FrequencyPlan::TtnEu | FrequencyPlan::DefaultEu => {
                variant == ModuleVariant::Rn2483
            }
            FrequencyPlan::TtnUs => variant == ModuleVariant::Rn2903,
        }
    }

    /// Commands making up the plan, in issue order
    pub fn commands(&self) -> PlanCommands {
        PlanCommands {
            plan: *self,
            index: 0,
        }
    }

    fn command(&self, index: usize) -> Option<Command> {
        match self {
            FrequencyPlan::SingleChannelEu => single_channel_eu(index),
            FrequencyPlan::TtnEu => ttn_eu(index),
            FrequencyPlan::TtnUs => ttn_us(index),
            FrequencyPlan::DefaultEu => default_eu(index),
        }
    }
}

/// Iterator over the commands of a [`FrequencyPlan`]
#[derive(Debug, Clone)]
pub struct PlanCommands {
    plan: FrequencyPlan,
    index: usize,
}

impl Iterator for PlanCommands {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        let command = self.plan.command(self.index)?;
        self.index += 1;
        Some(command)
    }
}

fn raw(text: &str) -> Option<Command> {
    format_command(format_args!("{}", text))
}

fn dcycle(channel: u8, value: u16) -> Option<Command> {
    format_command(format_args!("mac set ch dcycle {} {}", channel, value))
}

fn status(channel: u8, on: bool) -> Option<Command> {
    let state = if on { "on" } else { "off" };
    format_command(format_args!("mac set ch status {} {}", channel, state))
}

/// `status <ch> off` for channels 3 to 7
fn eu_optional_off(index: usize) -> Option<Command> {
    let channel = EU_FIRST_OPTIONAL_CHANNEL.checked_add(u8::try_from(index).ok()?)?;
    if channel > EU_LAST_CHANNEL {
        return None;
    }
    status(channel, false)
}

fn single_channel_eu(index: usize) -> Option<Command> {
    match index {
        0 => raw(MAC_SET_RX2_EU),
        1 => dcycle(0, 99),
        2 => dcycle(1, 65_535),
        3 => dcycle(2, 65_535),
        n => eu_optional_off(n - 4),
    }
}

fn default_eu(index: usize) -> Option<Command> {
    match index {
        0..=2 => dcycle(index as u8, DCYCLE_DEFAULT_EU),
        n => eu_optional_off(n - 3),
    }
}

fn ttn_eu(index: usize) -> Option<Command> {
    const OPTIONAL_STEPS: usize = 4;
    const OPTIONAL_START: usize = 4;
    const OPTIONAL_END: usize =
        OPTIONAL_START + OPTIONAL_STEPS * (EU_LAST_CHANNEL - EU_FIRST_OPTIONAL_CHANNEL + 1) as usize;

    match index {
        0 => raw(MAC_SET_RX2_EU),
        1..=3 => dcycle((index - 1) as u8, DCYCLE_TTN_EU),
        n if n < OPTIONAL_END => {
            let offset = (n - OPTIONAL_START) / OPTIONAL_STEPS;
            let channel = EU_FIRST_OPTIONAL_CHANNEL + offset as u8;
            match (n - OPTIONAL_START) % OPTIONAL_STEPS {
                0 => {
                    let freq = EU_CHANNEL_3_FREQ + offset as u32 * EU_CHANNEL_SPACING;
                    format_command(format_args!("mac set ch freq {} {}", channel, freq))
                }
                1 => format_command(format_args!("mac set ch drrange {} 0 5", channel)),
                2 => status(channel, true),
                _ => dcycle(channel, DCYCLE_TTN_EU),
            }
        }
        n if n == OPTIONAL_END => raw("mac set ch drrange 1 0 6"),
        _ => None,
    }
}

fn ttn_us(index: usize) -> Option<Command> {
    let channel = u8::try_from(index).ok()?;
    if channel >= US_CHANNEL_COUNT {
        return None;
    }
    let on = US_TTN_SUB_BAND.contains(&channel) || channel == US_TTN_WIDE_CHANNEL;
    status(channel, on)
}
