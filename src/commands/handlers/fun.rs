//! Novelty command handlers
//!
//! Handles: 8ball, dice, coinflip, rps

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::unknown;
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::Reply;

const EIGHT_BALL: &[&str] = &[
    "Yes",
    "No",
    "Maybe",
    "Definitely",
    "Not sure",
    "Ask again later",
    "Better not tell you now",
];
const RPS_CHOICES: &[&str] = &["rock", "paper", "scissors"];
const DEFAULT_SIDES: u32 = 6;
const MAX_SIDES: u32 = 1_000_000;

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("8ball", Category::Fun, "8ball [question]", "Ask the magic 8-ball").quoting(),
    CommandSpec::new("dice", Category::Fun, "dice [sides]", "Roll a die").quoting(),
    CommandSpec::new("coinflip", Category::Fun, "coinflip", "Heads or tails").quoting(),
    CommandSpec::new("rps", Category::Fun, "rps <rock|paper|scissors>", "Rock paper scissors").quoting(),
];

pub struct FunHandler;

#[async_trait]
impl PrefixCommandHandler for FunHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        _ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let text = match invocation.name.as_str() {
            "8ball" => format!("🎱 {}", pick(EIGHT_BALL)),
            "dice" => format!("🎲 You rolled a {}", roll(parse_sides(invocation.arg(0))?)),
            "coinflip" => format!("🪙 {}", if rand::rng().random_bool(0.5) { "Heads" } else { "Tails" }),
            "rps" => {
                let choice = parse_rps(invocation.arg(0))?;
                format!("You chose {choice}, I chose {}", pick(RPS_CHOICES))
            }
            other => return Err(unknown(other)),
        };
        Ok(Reply::quote(text))
    }
}

fn pick(options: &[&'static str]) -> &'static str {
    options.choose(&mut rand::rng()).copied().unwrap_or_default()
}

fn roll(sides: u32) -> u32 {
    rand::rng().random_range(1..=sides)
}

fn parse_sides(raw: Option<&str>) -> Result<u32, CommandError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SIDES);
    };
    raw.parse::<u32>()
        .ok()
        .filter(|sides| (1..=MAX_SIDES).contains(sides))
        .ok_or_else(|| {
            CommandError::usage(format!(
                "Please provide a number of sides between 1 and {MAX_SIDES}."
            ))
        })
}

fn parse_rps(raw: Option<&str>) -> Result<&'static str, CommandError> {
    let choice = raw.map(str::to_lowercase).unwrap_or_default();
    RPS_CHOICES
        .iter()
        .copied()
        .find(|option| *option == choice)
        .ok_or_else(|| CommandError::usage("Please choose rock, paper, or scissors!"))
}
