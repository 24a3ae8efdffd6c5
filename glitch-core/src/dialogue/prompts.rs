//! Prompt text for NPC dialogue.

use super::DialogueContext;

pub const LORE_POEM: &str = "\"Listen close to the digital lore\n\
Of a black cat and a bot at the core...\n\
Where pixels are kingdoms and code is law\n\
Where the bot cooked slop with a furry paw...\"";

/// Per-character voice notes, keyed by display name.
pub const CHARACTER_TONES: &[(&str, &str)] = &[
    (
        "Black Cat",
        "Sarcastic, posts trash, says \"meow\" sometimes, rude but loyal eventually. Loves \"slop\" art.",
    ),
    (
        "Algorithm King",
        "Arrogant, cold, obsessed with \"metrics\", \"engagement\", and \"perfection\". Wants to ban the player.",
    ),
    ("Barkeep VPN", "Secretive, helpful, speaks in whispers."),
];

/// Most recent history lines sent along with a request.
const HISTORY_WINDOW: usize = 6;

pub fn system_prompt(npc_name: &str) -> String {
    let mut prompt = String::from("You are an NPC in a digital RPG called \"Glitch Protocol\".\n");
    prompt.push_str(&format!("The lore is based on this poem: {LORE_POEM}\n\n"));
    prompt.push_str(&format!("You are roleplaying as: {npc_name}.\n\n"));
    prompt.push_str("Tone instructions based on character:\n");
    for (name, tone) in CHARACTER_TONES {
        prompt.push_str(&format!("- {name}: {tone}\n"));
    }
    prompt.push_str("\nKeep responses short (under 30 words) and RPG-style.\nDo not break character.");
    prompt
}

pub fn user_prompt(context: &DialogueContext) -> String {
    let mut prompt = String::new();
    let skip = context.history.len().saturating_sub(HISTORY_WINDOW);
    if skip < context.history.len() {
        prompt.push_str("Conversation so far:\n");
        for line in &context.history[skip..] {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "Player says: \"{}\". Respond as {}.",
        context.player_input.trim(),
        context.npc_name
    ));
    prompt
}
