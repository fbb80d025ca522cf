use global_constants::{MAX_PROMPT_LENGTH, MIN_PROMPT_LENGTH};

use crate::types::VideoGenError;

/// Length bounds for prompts, counted in characters after trimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptLimits {
    pub min: usize,
    pub max: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            min: MIN_PROMPT_LENGTH,
            max: MAX_PROMPT_LENGTH,
        }
    }
}

impl PromptLimits {
    pub fn with_max(max: usize) -> Self {
        Self {
            max,
            ..Default::default()
        }
    }

    /// Returns the trimmed prompt or the reason it was rejected.
    pub fn validate(&self, prompt: Option<&str>) -> Result<String, String> {
        let trimmed = match prompt.map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => return Err("Prompt must be a non-empty string".to_string()),
        };

        let len = trimmed.chars().count();
        if len < self.min {
            return Err(format!(
                "Prompt must be at least {} characters long",
                self.min
            ));
        }
        if len > self.max {
            return Err(format!("Prompt must not exceed {} characters", self.max));
        }

        Ok(trimmed.to_string())
    }

    pub fn validate_prompt(&self, prompt: Option<&str>) -> Result<String, VideoGenError> {
        self.validate(prompt).map_err(VideoGenError::BadRequest)
    }

    /// Enhanced prompts only grow, so only the upper bound can be violated.
    pub fn check_enhanced(&self, enhanced: &str) -> Result<(), VideoGenError> {
        if enhanced.chars().count() > self.max {
            return Err(VideoGenError::BadRequest(format!(
                "Enhanced prompt must not exceed {} characters",
                self.max
            )));
        }
        Ok(())
    }
}

/// Joins `[style, base, camera_movement, visual_effect]` with `", "`, skipping
/// empty parts. The order is fixed.
pub fn build_enhanced_prompt(
    base: &str,
    camera_movement: &str,
    visual_effect: &str,
    style: &str,
) -> String {
    [style, base, camera_movement, visual_effect]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
