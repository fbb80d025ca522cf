use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::types::EnhancementOption;

type OptionRow = (&'static str, &'static str, &'static str);

const CAMERA_MOVEMENT_ROWS: &[OptionRow] = &[
    ("Static", "", "No camera movement"),
    ("Zoom In", "[Zoom in]", "Camera moves closer to subject"),
    ("Zoom Out", "[Zoom out]", "Camera moves away from subject"),
    ("Pan Left", "[Pan left]", "Camera pans to the left"),
    ("Pan Right", "[Pan right]", "Camera pans to the right"),
    ("Tilt Up", "[Tilt up]", "Camera tilts upward"),
    ("Tilt Down", "[Tilt down]", "Camera tilts downward"),
    ("Tracking Shot", "[Tracking shot]", "Camera follows subject"),
    ("Dolly In", "[Dolly in]", "Smooth forward movement"),
    ("Dolly Out", "[Dolly out]", "Smooth backward movement"),
    ("Crane Shot", "[Crane shot]", "Vertical camera movement"),
    ("Shake", "[Shake]", "Handheld camera effect"),
];

const VISUAL_EFFECT_ROWS: &[OptionRow] = &[
    ("None", "", "No special effects"),
    ("Cinematic", "cinematic lighting, film grain", "Movie-like quality"),
    (
        "Dramatic",
        "dramatic lighting, high contrast",
        "Strong shadows and highlights",
    ),
    ("Soft", "soft lighting, gentle glow", "Soft, diffused light"),
    (
        "Golden Hour",
        "golden hour, warm sunset lighting",
        "Warm, natural light",
    ),
    ("Foggy", "fog, misty atmosphere", "Atmospheric fog effect"),
    (
        "Rainy",
        "rain, wet surfaces, water droplets",
        "Rain and wet environment",
    ),
    ("Slow Motion", "slow motion, high fps", "Slow-motion effect"),
];

const VIDEO_STYLE_ROWS: &[OptionRow] = &[
    (
        "Realistic",
        "photorealistic, 4k, high detail",
        "Photorealistic style",
    ),
    (
        "Cinematic",
        "cinematic, movie scene, professional",
        "Hollywood movie style",
    ),
    ("Anime", "anime style, animated", "Japanese animation style"),
    ("Cartoon", "cartoon style, animated", "Western cartoon style"),
    ("3D Render", "3D render, CGI, Pixar style", "3D animated style"),
    (
        "Vintage",
        "vintage film, retro, old footage",
        "Old film aesthetic",
    ),
    (
        "Sci-Fi",
        "sci-fi, futuristic, cyberpunk",
        "Science fiction style",
    ),
    ("Fantasy", "fantasy, magical, ethereal", "Fantasy world style"),
];

const EXAMPLE_PROMPT_ROWS: &[(&str, &[&str])] = &[
    (
        "Nature",
        &[
            "A majestic waterfall cascading down mossy rocks in a lush rainforest",
            "Ocean waves crashing on a rocky shore at sunset with seagulls flying",
            "A field of sunflowers swaying in the breeze under a blue sky",
            "Northern lights dancing across the Arctic sky over snowy mountains",
        ],
    ),
    (
        "Animals",
        &[
            "A golden retriever running through a field of flowers at sunset",
            "A majestic eagle soaring through clouds above mountain peaks",
            "A playful dolphin jumping out of crystal clear ocean water",
            "A red fox walking through a snowy forest in winter",
        ],
    ),
    (
        "Urban",
        &[
            "City street with cars and pedestrians at night, neon lights reflecting on wet pavement",
            "Time-lapse of clouds moving over modern skyscrapers in downtown",
            "A busy coffee shop with people working on laptops, warm lighting",
            "Subway train arriving at platform with commuters waiting",
        ],
    ),
    (
        "Fantasy",
        &[
            "A magical portal opening in an ancient forest with glowing particles",
            "A dragon flying over a medieval castle at dawn",
            "Floating islands in the sky connected by glowing bridges",
            "A wizard casting a spell with colorful magical energy swirling",
        ],
    ),
    (
        "Action",
        &[
            "A sports car drifting around a corner on a race track",
            "A skateboarder performing tricks in an urban skate park",
            "A surfer riding a massive wave in slow motion",
            "A basketball player making a slam dunk in an arena",
        ],
    ),
];

fn to_options(rows: &[OptionRow]) -> Vec<EnhancementOption> {
    rows.iter()
        .map(|(name, tag, description)| EnhancementOption {
            name: name.to_string(),
            tag: tag.to_string(),
            description: description.to_string(),
        })
        .collect()
}

pub static CAMERA_MOVEMENTS: LazyLock<Vec<EnhancementOption>> =
    LazyLock::new(|| to_options(CAMERA_MOVEMENT_ROWS));

pub static VISUAL_EFFECTS: LazyLock<Vec<EnhancementOption>> =
    LazyLock::new(|| to_options(VISUAL_EFFECT_ROWS));

pub static VIDEO_STYLES: LazyLock<Vec<EnhancementOption>> =
    LazyLock::new(|| to_options(VIDEO_STYLE_ROWS));

pub static EXAMPLE_PROMPTS: LazyLock<IndexMap<String, Vec<String>>> = LazyLock::new(|| {
    EXAMPLE_PROMPT_ROWS
        .iter()
        .map(|(category, prompts)| {
            (
                category.to_string(),
                prompts.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
});
