//! Flavor text for live actions.
//!
//! Commentary draws come from their own stream (keyed like the tick that
//! produced them) so describing a tick never shifts a combat roll.

use rand::Rng;

use super::action::{ActionKind, LiveAction};
use super::state::FightState;
use crate::fight::FightId;
use crate::fighter::Combatant;
use crate::rng;

/// Reported damage above this turns an exchange into a critical.
pub const CRITICAL_ACTION_DAMAGE: i32 = 4_000;

/// Either lane at or below this marks the action as low-health.
pub const LOW_HEALTH: i32 = 20_000;

pub struct Announcer {
    pub name: &'static str,
    pub lines: &'static [&'static str],
}

pub const ANNOUNCERS: [Announcer; 4] = [
    Announcer {
        name: "Chud Puncherson",
        lines: &[
            "HOLY MOLY! Did you see that molecular realignment?!",
            "That's gonna leave a mark on their existential dread!",
            "I'VE NEVER SEEN VIOLENCE THIS BEAUTIFUL!",
            "That fighter just got sent to the SHADOW REALM!",
            "SWEET MOTHER OF CHAOS! What a hit!",
            "Their ancestors felt that one from the afterlife!",
            "GREAT GOOGLY MOOGLY! The chaos energy is off the charts!",
            "CHEESE AND CRACKERS! That's championship-level destruction!",
        ],
    },
    Announcer {
        name: "Dr. Mayhem PhD",
        lines: &[
            "From a scientific perspective, that spleen is COMPLETELY destroyed!",
            "The molecular density of that impact was off the charts!",
            "That level of existential dread should be medically impossible!",
            "The horoscope alignment is causing unprecedented violence!",
            "According to my calculations, that should have been fatal!",
            "The biomechanical stress patterns are absolutely fascinating!",
        ],
    },
    Announcer {
        name: "\"Screaming\" Sally Bloodworth",
        lines: &[
            "I'VE NEVER SEEN SUCH BEAUTIFUL CARNAGE!",
            "YES! MORE VIOLENCE! FEED THE CHAOS GODS!",
            "BLOOD FOR THE BLOOD DIMENSION!",
            "I'M LITERALLY CRYING TEARS OF JOY!",
            "MAGNIFICENT BRUTALITY! THE CHAOS SPIRITS ARE PLEASED!",
            "TEAR APART THE FABRIC OF REALITY ITSELF!",
        ],
    },
    Announcer {
        name: "THE COMMISSIONER",
        lines: &[
            "The Department approves of this violence level.",
            "This combat meets our chaos quotas.",
            "Violence parameters are within acceptable ranges.",
            "The Commissioner is... pleased.",
            "Existential dread levels: OPTIMAL.",
            "Combat effectiveness: SATISFACTORY.",
        ],
    },
];

const SALLY: usize = 2;

const COMBAT_ACTIONS: &[&str] = &[
    "BONE-CRUSHING HAYMAKER",
    "DEVASTATING ELBOW DROP FROM THE TOP ROPE",
    "BRUTAL KNEE TO THE SOLAR PLEXUS",
    "VICIOUS UPPERCUT SENDS TEETH FLYING",
    "CATASTROPHIC BODY SLAM SHAKES THE ARENA",
    "LIGHTNING-FAST JAB TO THE TEMPLE",
    "MERCILESS LIVER PUNCH",
    "EARTH-SHATTERING ROUNDHOUSE KICK",
    "SAVAGE HEADBUTT TO THE NOSE",
    "APOCALYPTIC SPINNING BACKFIST",
    "REALITY-BENDING SUPLEX",
    "DIMENSION-SPLITTING CLOTHESLINE",
    "CHAOS-INDUCING PILE DRIVER",
    "THE COMMISSIONER'S FIST",
    "SKULL-FRACTURING HAMMER FIST",
    "VERTEBRAE-SNAPPING GERMAN SUPLEX",
    "ORGAN-SHUFFLING POWERBOMB",
    "JAW-DISLOCATING HAYMAKER",
    "SHOULDER-SEPARATING CLOTHESLINE",
    "LUMBAR-DESTROYING BACKBREAKER",
];

const DEATH_MESSAGES: &[&str] = &[
    "FATALITY! {} has reached MAXIMUM existential dread!",
    "GAME OVER! {} has been sent to the CHAOS DIMENSION!",
    "OBLITERATION! {}'s molecular structure has COLLAPSED!",
    "ANNIHILATION! {} has achieved the ultimate existential crisis!",
    "DESTRUCTION! {}'s blood type couldn't save them now!",
];

const KNOCKOUT_MESSAGES: &[&str] = &[
    "KNOCKOUT! {} is face down on the canvas!",
    "LIGHTS OUT! {} won't be getting up from that!",
    "IT'S OVER! {} has been beaten into the next time zone!",
];

/// The ordinary exchange of a tick, told from one side's point of view.
pub fn exchange_action(
    fight_id: FightId,
    tick: u32,
    one: &Combatant,
    two: &Combatant,
    state: &FightState,
) -> LiveAction {
    let mut rng = rng::seeded(rng::fight_tick_seed(fight_id, tick));

    let (attacker, victim, damage) = if rng.gen_range(0..2) == 0 {
        (one, two, state.last_damage2)
    } else {
        (two, one, state.last_damage1)
    };

    let move_name = COMBAT_ACTIONS[rng.gen_range(0..COMBAT_ACTIONS.len())];
    let mut text = format!("{}! {} connects for {} damage!", move_name, attacker.name, format_number(damage));
    let mut kind = ActionKind::Damage;
    if damage > CRITICAL_ACTION_DAMAGE {
        kind = ActionKind::Critical;
        text = format!("CRITICAL HIT! {}", text);
    }
    if state.health1 <= LOW_HEALTH || state.health2 <= LOW_HEALTH {
        kind = ActionKind::LowHealth;
    }

    let announcer = &ANNOUNCERS[rng.gen_range(0..ANNOUNCERS.len())];
    let commentary = announcer.lines[rng.gen_range(0..announcer.lines.len())];

    LiveAction {
        kind,
        action: text,
        damage,
        attacker: attacker.name.clone(),
        victim: victim.name.clone(),
        commentary: commentary.to_string(),
        announcer: announcer.name.to_string(),
        health1: state.health1,
        health2: state.health2,
        round: state.round,
        tick_number: tick,
        frenzy1: None,
        frenzy2: None,
    }
}

pub fn comeback_crit_action(
    attacker: &Combatant,
    victim: &Combatant,
    bonus: i32,
    state: &FightState,
) -> LiveAction {
    LiveAction {
        kind: ActionKind::ComebackCrit,
        action: format!(
            "COMEBACK CRIT! {} detonates {} for {} bonus damage!",
            attacker.name,
            victim.name,
            format_number(bonus)
        ),
        damage: bonus,
        attacker: attacker.name.clone(),
        victim: victim.name.clone(),
        commentary: String::new(),
        announcer: ANNOUNCERS[SALLY].name.to_string(),
        health1: state.health1,
        health2: state.health2,
        round: state.round,
        tick_number: state.tick,
        frenzy1: None,
        frenzy2: None,
    }
}

pub fn death_action(fight_id: FightId, winner: &Combatant, loser: &Combatant, state: &FightState) -> LiveAction {
    let mut rng = rng::seeded(rng::fight_tick_seed(fight_id, rng::DEATH_SEED_TICK));
    let message = DEATH_MESSAGES[rng.gen_range(0..DEATH_MESSAGES.len())];
    finishing_action(
        ActionKind::Death,
        message.replace("{}", &loser.name),
        winner,
        loser,
        "THIS IS THE MOST BEAUTIFUL VIOLENCE I'VE EVER WITNESSED!",
        state,
    )
}

pub fn knockout_action(fight_id: FightId, winner: &Combatant, loser: &Combatant, state: &FightState) -> LiveAction {
    let mut rng = rng::seeded(rng::fight_tick_seed(fight_id, state.tick));
    let message = KNOCKOUT_MESSAGES[rng.gen_range(0..KNOCKOUT_MESSAGES.len())];
    finishing_action(
        ActionKind::Knockout,
        message.replace("{}", &loser.name),
        winner,
        loser,
        "SOMEBODY GET A MOP AND A PRIEST!",
        state,
    )
}

fn finishing_action(
    kind: ActionKind,
    text: String,
    winner: &Combatant,
    loser: &Combatant,
    commentary: &str,
    state: &FightState,
) -> LiveAction {
    LiveAction {
        kind,
        action: text,
        damage: 0,
        attacker: winner.name.clone(),
        victim: loser.name.clone(),
        commentary: commentary.to_string(),
        announcer: ANNOUNCERS[SALLY].name.to_string(),
        health1: state.health1,
        health2: state.health2,
        round: state.round,
        tick_number: state.tick,
        frenzy1: None,
        frenzy2: None,
    }
}

/// Announcement for the round that just started.
pub fn round_action(state: &FightState) -> LiveAction {
    LiveAction {
        kind: ActionKind::Round,
        action: format!("ROUND {} BEGINS! The violence escalates to unprecedented levels!", state.round),
        damage: 0,
        attacker: String::new(),
        victim: String::new(),
        commentary: "Here we go again! More beautiful chaos incoming!".to_string(),
        announcer: ANNOUNCERS[0].name.to_string(),
        health1: state.health1,
        health2: state.health2,
        round: state.round,
        tick_number: state.tick,
        frenzy1: None,
        frenzy2: None,
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn format_number(n: i32) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
