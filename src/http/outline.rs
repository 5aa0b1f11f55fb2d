use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Load the outline document from `path`, or fall back to the built-in sample
pub fn load_outline(path: Option<&str>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(default_outline());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read outline file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid outline JSON in {}", path))
}

/// Sample research outline used when no outline file is configured
pub fn default_outline() -> Value {
    json!({
        "name": null,
        "description": null,
        "goal": {
            "product_name": "Notebook",
            "target_users": "Students and knowledge workers",
            "business_type": "Note taking",
            "research_goal": "Understand everyday note-taking habits"
        },
        "proposal": null,
        "outline": {
            "sections": [
                {
                    "name": "Warm-up and background",
                    "questions": [
                        {
                            "main": "How did you start taking notes digitally?",
                            "probes": [
                                "What made you pick your current app?",
                                "When do you usually take notes?"
                            ]
                        }
                    ]
                },
                {
                    "name": "Pain points",
                    "questions": [
                        {
                            "main": "What gets in your way when capturing or finding notes?",
                            "probes": [
                                "Can you describe a recent frustrating moment?",
                                "Which steps feel slow or error-prone?"
                            ]
                        }
                    ]
                },
                {
                    "name": "Wrap-up",
                    "questions": [
                        {
                            "main": "What is the one thing you would change?",
                            "probes": []
                        }
                    ]
                }
            ],
            "opening_script": {
                "greeting": "Hi, thanks for joining this interview.",
                "purpose": "We'd like to learn how you take and use notes.",
                "duration": "About 20 minutes.",
                "consent": "The conversation is transcribed for research purposes only."
            }
        }
    })
}
