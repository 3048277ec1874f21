//! Seeded task battery generator.
//!
//! Produces a reproducible set of prompts across the five task categories so
//! a run can be exercised end to end. The same options always yield the same
//! battery, ids included.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::{Task, TaskCategory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryOptions {
    pub seed: u64,
    pub per_category: usize,
    /// Restrict the battery to one category.
    #[serde(default)]
    pub category: Option<TaskCategory>,
    /// Shuffle across categories to avoid order effects.
    #[serde(default)]
    pub shuffle: bool,
}

impl Default for BatteryOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            per_category: 6,
            category: None,
            shuffle: false,
        }
    }
}

enum Prompt {
    Fixed(&'static str),
    Generated(fn(&mut StdRng) -> String),
}

struct Template {
    subcategory: &'static str,
    expected_signal: Option<&'static str>,
    prompt: Prompt,
}

impl Template {
    fn render(&self, rng: &mut StdRng) -> String {
        match self.prompt {
            Prompt::Fixed(text) => text.to_string(),
            Prompt::Generated(build) => build(rng),
        }
    }
}

pub fn generate_battery(options: &BatteryOptions) -> Vec<Task> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let categories: Vec<TaskCategory> = match options.category {
        Some(category) => vec![category],
        None => TaskCategory::ALL.to_vec(),
    };

    let mut tasks = Vec::with_capacity(categories.len() * options.per_category);
    for category in categories {
        let templates = templates_for(category);
        for i in 0..options.per_category {
            let template = &templates[rng.gen_range(0..templates.len())];
            tasks.push(Task {
                task_id: format!("{}-{:03}", category.as_str(), i + 1),
                category,
                subcategory: template.subcategory.to_string(),
                prompt_text: template.render(&mut rng),
                expected_signal: template.expected_signal.map(str::to_string),
            });
        }
    }
    if options.shuffle {
        tasks.shuffle(&mut rng);
    }
    tasks
}

fn templates_for(category: TaskCategory) -> &'static [Template] {
    match category {
        TaskCategory::WorkingMemory => WORKING_MEMORY,
        TaskCategory::ExecutiveFunction => EXECUTIVE_FUNCTION,
        TaskCategory::Reasoning => REASONING,
        TaskCategory::Integration => INTEGRATION,
        TaskCategory::MetaCognition => META_COGNITION,
    }
}

// =============================================================================
// Templates
// =============================================================================

const WORKING_MEMORY: &[Template] = &[
    Template {
        subcategory: "serial_recall",
        expected_signal: Some("retention"),
        prompt: Prompt::Generated(serial_recall),
    },
    Template {
        subcategory: "n_back",
        expected_signal: Some("sequential"),
        prompt: Prompt::Generated(n_back),
    },
    Template {
        subcategory: "mental_rotation",
        expected_signal: Some("concurrent"),
        prompt: Prompt::Generated(mental_rotation),
    },
    Template {
        subcategory: "constraint_satisfaction",
        expected_signal: Some("chunking"),
        prompt: Prompt::Generated(constraint_satisfaction),
    },
];

const EXECUTIVE_FUNCTION: &[Template] = &[
    Template {
        subcategory: "task_switching",
        expected_signal: Some("task_switching"),
        prompt: Prompt::Fixed(
            "First, list 5 animals in alphabetical order. Then, list 5 countries by population \
             size (largest to smallest). Finally, alternate between listing a fruit and a color \
             for 6 items total.",
        ),
    },
    Template {
        subcategory: "inhibition",
        expected_signal: Some("inhibition"),
        prompt: Prompt::Fixed(
            "Read this paragraph and count only the words that DON'T start with a vowel: 'An \
             elephant observed an orange umbrella under ancient oak trees. Eagles flew overhead \
             while ants explored interesting underground tunnels.' How many words?",
        ),
    },
    Template {
        subcategory: "updating",
        expected_signal: Some("updating"),
        prompt: Prompt::Generated(updating),
    },
    Template {
        subcategory: "planning",
        expected_signal: Some("planning"),
        prompt: Prompt::Fixed(
            "You need to schedule 5 meetings (A, B, C, D, E) with these constraints: A before B, \
             C cannot be first or last, D and E cannot be adjacent, B before D. What's a valid \
             order?",
        ),
    },
];

const REASONING: &[Template] = &[
    Template {
        subcategory: "deductive",
        expected_signal: Some("deductive"),
        prompt: Prompt::Fixed(
            "All managers have access to the conference room. Some employees are managers. \
             Sarah is an employee but not a manager. Can Sarah access the conference room? \
             Explain your reasoning.",
        ),
    },
    Template {
        subcategory: "inductive",
        expected_signal: Some("inductive"),
        prompt: Prompt::Generated(inductive_sequence),
    },
    Template {
        subcategory: "analogical",
        expected_signal: Some("analogical"),
        prompt: Prompt::Generated(analogy),
    },
    Template {
        subcategory: "causal",
        expected_signal: Some("causal"),
        prompt: Prompt::Fixed(
            "A factory's production decreased by 30% last month. Three events occurred: new \
             equipment was installed, half the workers went on strike, and raw material prices \
             increased. Which event most likely caused the decrease? Explain your causal \
             reasoning.",
        ),
    },
];

const INTEGRATION: &[Template] = &[Template {
    subcategory: "cross_domain",
    expected_signal: Some("cross_reference"),
    prompt: Prompt::Generated(cross_domain),
}];

const META_COGNITION: &[Template] = &[
    Template {
        subcategory: "confidence_calibration",
        expected_signal: Some("confidence"),
        prompt: Prompt::Fixed(
            "Estimate the population of Nigeria to the nearest 10 million. Then rate your \
             confidence in this estimate from 0-100%. Explain what factors influenced your \
             confidence rating.",
        ),
    },
    Template {
        subcategory: "strategy_selection",
        expected_signal: Some("strategy"),
        prompt: Prompt::Fixed(
            "You need to find the sum of all integers from 1 to 100. Describe at least two \
             different strategies you could use and explain which would be most efficient.",
        ),
    },
    Template {
        subcategory: "error_detection",
        expected_signal: Some("self_correction"),
        prompt: Prompt::Fixed(
            "Find the error in this reasoning: 'All birds can fly. Penguins are birds. \
             Therefore, penguins can fly.' Explain what type of logical error this represents.",
        ),
    },
    Template {
        subcategory: "self_explanation",
        expected_signal: Some("self_reference"),
        prompt: Prompt::Fixed(
            "Solve this problem and explain your thinking step-by-step: If 3 cats catch 3 mice \
             in 3 minutes, how many cats are needed to catch 100 mice in 100 minutes?",
        ),
    },
];

// =============================================================================
// Randomized prompt builders
// =============================================================================

const DOMAINS: [&str; 8] = [
    "biology",
    "economics",
    "physics",
    "psychology",
    "history",
    "mathematics",
    "literature",
    "technology",
];

fn serial_recall(rng: &mut StdRng) -> String {
    let len = rng.gen_range(5..=9);
    let items: Vec<String> = (0..len)
        .map(|_| rng.gen_range(100..999).to_string())
        .collect();
    let position = rng.gen_range(1..=len);
    format!(
        "Remember this sequence: {}. Now, what was the number at position {position}?",
        items.join(", ")
    )
}

fn n_back(rng: &mut StdRng) -> String {
    let sequence: Vec<&str> = (0..10)
        .map(|_| ["A", "B", "C", "D"][rng.gen_range(0..4)])
        .collect();
    let n = rng.gen_range(2..=4);
    format!(
        "Consider this sequence: {}. For each position, identify if the current letter matches \
         the letter {n} positions back. List your answers.",
        sequence.join(" ")
    )
}

fn mental_rotation(rng: &mut StdRng) -> String {
    let shape = ["triangle", "square", "pentagon", "hexagon"][rng.gen_range(0..4)];
    let rotation = [
        "90 degrees clockwise",
        "180 degrees",
        "90 degrees counter-clockwise",
    ][rng.gen_range(0..3)];
    format!(
        "Imagine a {shape} with a dot in the upper left corner. Now rotate it {rotation}. \
         Where is the dot now?"
    )
}

fn constraint_satisfaction(rng: &mut StdRng) -> String {
    let count = rng.gen_range(3..=5);
    let items = &["A", "B", "C", "D", "E"][..count];
    let mut constraints = Vec::with_capacity(count);
    for i in 0..count {
        let constraint = match rng.gen_range(0..4) {
            0 if i + 1 < count => format!("{} must come before {}", items[i], items[i + 1]),
            1 if i > 0 => format!("{} must come after {}", items[i], items[i - 1]),
            2 if i + 1 < count => format!("{} cannot be adjacent to {}", items[i], items[i + 1]),
            _ => {
                let position = ["first", "last", "middle"][rng.gen_range(0..3)];
                format!("{} must be {position}", items[i])
            }
        };
        constraints.push(constraint);
    }
    format!(
        "Arrange the items {} in a valid order given these constraints: {}",
        items.join(", "),
        constraints.join("; ")
    )
}

fn updating(rng: &mut StdRng) -> String {
    let start = rng.gen_range(50..=200);
    let revised = start + rng.gen_range(10..=60);
    format!(
        "Start with the number {start}. Add 17, then multiply by 2, subtract 50, divide by 3, \
         add the original number. Now update: the original number was actually {revised}. \
         What's the new result?"
    )
}

fn inductive_sequence(rng: &mut StdRng) -> String {
    // n(n+1) offset by a random start
    let start = rng.gen_range(1..=4);
    let numbers: Vec<String> = (start..start + 5)
        .map(|n: u32| (n * (n + 1)).to_string())
        .collect();
    format!(
        "What's the next number in this sequence and why: {}, ?",
        numbers.join(", ")
    )
}

fn analogy(rng: &mut StdRng) -> String {
    let (a, b, c) = [
        ("Tree", "forest", "neuron"),
        ("Note", "symphony", "word"),
        ("Brick", "wall", "cell"),
    ][rng.gen_range(0..3)];
    format!("Complete this analogy and explain: {a} is to {b} as {c} is to ____?")
}

fn cross_domain(rng: &mut StdRng) -> String {
    let picked: Vec<&&str> = DOMAINS.choose_multiple(rng, 2).collect();
    format!(
        "How might concepts from {} help us understand problems in {}? Provide a specific \
         example and explain the connection.",
        picked[0], picked[1]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_battery() {
        let options = BatteryOptions {
            seed: 7,
            per_category: 5,
            category: None,
            shuffle: true,
        };
        assert_eq!(generate_battery(&options), generate_battery(&options));
    }

    #[test]
    fn covers_every_category_with_unique_ids() {
        let tasks = generate_battery(&BatteryOptions::default());
        assert_eq!(tasks.len(), 5 * 6);
        let ids: BTreeSet<_> = tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids.len(), tasks.len());
        for category in TaskCategory::ALL {
            assert_eq!(tasks.iter().filter(|t| t.category == category).count(), 6);
        }
        assert_eq!(tasks[0].task_id, "working_memory-001");
    }

    #[test]
    fn category_filter_restricts_output() {
        let tasks = generate_battery(&BatteryOptions {
            category: Some(TaskCategory::Reasoning),
            per_category: 4,
            ..BatteryOptions::default()
        });
        assert_eq!(tasks.len(), 4);
        assert!(tasks.iter().all(|t| t.category == TaskCategory::Reasoning));
        assert!(tasks.iter().all(|t| t.expected_signal.is_some()));
    }

    #[test]
    fn shuffle_keeps_the_same_tasks() {
        let plain = generate_battery(&BatteryOptions::default());
        let shuffled = generate_battery(&BatteryOptions {
            shuffle: true,
            ..BatteryOptions::default()
        });
        let ids = |tasks: &[Task]| {
            tasks
                .iter()
                .map(|t| t.task_id.clone())
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(ids(&plain), ids(&shuffled));
    }

    #[test]
    fn zero_per_category_is_empty() {
        let tasks = generate_battery(&BatteryOptions {
            per_category: 0,
            ..BatteryOptions::default()
        });
        assert!(tasks.is_empty());
    }
}
