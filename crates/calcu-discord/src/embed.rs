//! Result embeds: a green card whose title is the rendered value.

use serenity::builder::CreateEmbed;

/// Discord's embed title limit, in characters.
const TITLE_MAX: usize = 256;

pub const RESULT_COLOUR: u32 = 0x2ecc71;

/// Clamp `presentation` to what Discord accepts as an embed title.
pub fn title_text(presentation: &str) -> String {
    if presentation.chars().count() <= TITLE_MAX {
        return presentation.to_string();
    }
    let mut title: String = presentation.chars().take(TITLE_MAX - 1).collect();
    title.push('…');
    title
}

pub fn result_embed(presentation: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title_text(presentation))
        .colour(RESULT_COLOUR)
}
