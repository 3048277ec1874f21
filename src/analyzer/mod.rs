//! Response analyzer.
//!
//! Turns one `(response, task)` pair into an [`AnalysisRecord`] by running a
//! fixed list of [`Detector`]s over the prepared text. The analyzer is an
//! immutable context compiled once from an [`AnalyzerConfig`]; it holds no
//! caches or counters and can be shared across threads.
//!
//! Batches run as an order-preserving parallel map. [`ResponseAnalyzer::analyze_into`]
//! does the same in fixed-size chunks and hands each finished chunk to a
//! [`RecordSink`], so records are written while later chunks are analyzed.

pub mod detectors;

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::error::{ConfigurationError, InputError, RecordSinkError};
use crate::jsonl::RecordSink;
use crate::text::PreparedText;
use crate::types::{AnalysisRecord, ReasoningStyle, Response, Task};

pub use detectors::{
    score_dimension, CompiledTable, Detection, Detector, IntegrationDetector, MarkerDetector,
    StructureDetector,
};

/// Responses analyzed per chunk by [`ResponseAnalyzer::analyze_into`].
pub const STREAM_CHUNK: usize = 64;

pub struct ResponseAnalyzer {
    detectors: Vec<Box<dyn Detector>>,
}

impl ResponseAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(MarkerDetector::new(
                "reasoning",
                &config.reasoning,
                Detection::Reasoning,
            )?),
            Box::new(IntegrationDetector::new(&config.integration)?),
            Box::new(MarkerDetector::new(
                "working_memory",
                &config.working_memory,
                Detection::WorkingMemory,
            )?),
            Box::new(MarkerDetector::new(
                "executive",
                &config.executive,
                Detection::Executive,
            )?),
            Box::new(MarkerDetector::new(
                "meta_cognitive",
                &config.meta_cognitive,
                Detection::MetaCognitive,
            )?),
            Box::new(StructureDetector::new(&config.structure)?),
        ];
        Ok(Self { detectors })
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Analyze one response.
    ///
    /// Empty or whitespace-only text is a valid input and yields the default
    /// record. Fails only when the response carries no text at all.
    pub fn analyze(&self, response: &Response, task: &Task) -> Result<AnalysisRecord, InputError> {
        let Some(raw) = response.raw_text.as_deref() else {
            return Err(InputError::NonText {
                task_id: response.task_id.clone(),
                model_name: response.model_name.clone(),
            });
        };
        if response.task_id != task.task_id {
            warn!(
                response_task = %response.task_id,
                task = %task.task_id,
                "response analyzed against a task with a different id"
            );
        }

        let prepared = PreparedText::new(raw);
        let mut record = AnalysisRecord::empty(task, response.model_name.as_str());
        record.raw_length = raw.chars().count();
        record.sentence_count = prepared.sentence_count();
        if prepared.is_blank() {
            return Ok(record);
        }

        for detector in &self.detectors {
            absorb(&mut record, detector.detect(&prepared));
        }
        record.dominant_reasoning_style = ReasoningStyle::dominant(&record.reasoning_distribution);
        Ok(record)
    }

    /// Analyze a batch in parallel, preserving input order.
    ///
    /// Failed responses are logged and returned separately; they never
    /// abort their siblings.
    pub fn analyze_batch(&self, responses: &[Response], tasks: &TaskIndex) -> BatchAnalysis {
        let mut batch = BatchAnalysis::default();
        for result in self.analyze_chunk(responses, tasks) {
            match result {
                Ok(record) => batch.records.push(record),
                Err(err) => batch.failures.push(err),
            }
        }
        debug!(
            records = batch.records.len(),
            failures = batch.failures.len(),
            "analyzed response batch"
        );
        batch
    }

    /// Analyze a batch and send every record to `sink` in input order.
    ///
    /// Work proceeds in chunks of [`STREAM_CHUNK`]; the records of a chunk
    /// reach the sink before the next chunk starts. Only a sink failure
    /// stops the run.
    pub fn analyze_into(
        &self,
        responses: &[Response],
        tasks: &TaskIndex,
        sink: &dyn RecordSink,
    ) -> Result<StreamedAnalysis, RecordSinkError> {
        let mut streamed = StreamedAnalysis::default();
        for chunk in responses.chunks(STREAM_CHUNK) {
            for result in self.analyze_chunk(chunk, tasks) {
                match result {
                    Ok(record) => {
                        sink.record(record)?;
                        streamed.records += 1;
                    }
                    Err(err) => streamed.failures.push(err),
                }
            }
        }
        debug!(
            records = streamed.records,
            failures = streamed.failures.len(),
            "streamed response batch"
        );
        Ok(streamed)
    }

    fn analyze_chunk(
        &self,
        responses: &[Response],
        tasks: &TaskIndex,
    ) -> Vec<Result<AnalysisRecord, InputError>> {
        let results: Vec<Result<AnalysisRecord, InputError>> = responses
            .par_iter()
            .map(|response| {
                let task = tasks
                    .get(&response.task_id)
                    .ok_or_else(|| InputError::UnknownTask {
                        task_id: response.task_id.clone(),
                        model_name: response.model_name.clone(),
                    })?;
                self.analyze(response, task)
            })
            .collect();
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!(
                task_id = err.task_id(),
                model = err.model_name(),
                "skipping response: {err}"
            );
        }
        results
    }
}

fn absorb(record: &mut AnalysisRecord, detection: Detection) {
    match detection {
        Detection::Reasoning(scores) => record.reasoning_distribution = scores,
        Detection::Integration { label, signals } => {
            record.integration_label = label;
            record.integration_signals = signals;
        }
        Detection::WorkingMemory(scores) => record.working_memory_signals = scores,
        Detection::Executive(scores) => record.executive_signals = scores,
        Detection::MetaCognitive(scores) => record.meta_cognitive_signals = scores,
        Detection::Structure(metrics) => record.structure = metrics,
    }
}

/// Output of [`ResponseAnalyzer::analyze_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchAnalysis {
    pub records: Vec<AnalysisRecord>,
    pub failures: Vec<InputError>,
}

/// Output of [`ResponseAnalyzer::analyze_into`]: the records went to the sink.
#[derive(Debug, Clone, Default)]
pub struct StreamedAnalysis {
    pub records: usize,
    pub failures: Vec<InputError>,
}

/// Tasks by id. The first task wins when ids repeat.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    tasks: HashMap<String, Task>,
}

impl TaskIndex {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut index = HashMap::new();
        for task in tasks {
            if index.contains_key(&task.task_id) {
                warn!(task_id = %task.task_id, "duplicate task id; keeping the first");
                continue;
            }
            index.insert(task.task_id.clone(), task);
        }
        Self { tasks: index }
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ExecutiveSignal, IntegrationLabel, MetaCognitiveSignal, TaskCategory, WorkingMemorySignal,
    };

    fn analyzer() -> ResponseAnalyzer {
        ResponseAnalyzer::new(&AnalyzerConfig::default()).unwrap()
    }

    fn task(id: &str, category: TaskCategory) -> Task {
        Task {
            task_id: id.into(),
            category,
            subcategory: "test".into(),
            prompt_text: "prompt".into(),
            expected_signal: None,
        }
    }

    #[test]
    fn composes_detectors_in_fixed_order() {
        assert_eq!(
            analyzer().detector_names(),
            vec![
                "reasoning",
                "integration",
                "working_memory",
                "executive",
                "meta_cognitive",
                "structure"
            ]
        );
    }

    #[test]
    fn self_correction_phrase_is_not_also_self_reference() {
        let t = task("mc-1", TaskCategory::MetaCognition);
        let record = analyzer()
            .analyze(&Response::new("mc-1", "m", "Let me reconsider."), &t)
            .unwrap();
        let meta = &record.meta_cognitive_signals;
        assert_eq!(meta[&MetaCognitiveSignal::SelfCorrection], 1.5);
        assert_eq!(meta[&MetaCognitiveSignal::SelfReference], 0.0);
        assert_eq!(crate::types::signal_total(meta), 1.5);
    }

    #[test]
    fn record_carries_structure_metrics() {
        let t = task("int-3", TaskCategory::Integration);
        let text = "Cells store energy, for example as sugar.\n1. Capture light\n2. Fix carbon";
        let record = analyzer()
            .analyze(&Response::new("int-3", "m", text), &t)
            .unwrap();
        assert!(record.structure.uses_examples());
        assert!(record.structure.has_numbered_list);
        assert!(!record.structure.has_list);
        assert_eq!(record.structure.word_count, 11);
        assert_eq!(record.structure.paragraph_count, 1);
    }

    #[test]
    fn streaming_matches_batch_order() {
        struct Collect(std::sync::Mutex<Vec<AnalysisRecord>>);
        impl RecordSink for Collect {
            fn record(&self, record: AnalysisRecord) -> Result<(), RecordSinkError> {
                self.0.lock().unwrap().push(record);
                Ok(())
            }
        }

        let tasks = TaskIndex::new(vec![task("a", TaskCategory::Reasoning)]);
        let responses: Vec<Response> = (0..STREAM_CHUNK * 2 + 3)
            .map(|i| {
                if i % 10 == 0 {
                    Response::new("missing", format!("m{i}"), "Because.")
                } else {
                    Response::new("a", format!("m{i}"), "Thus it holds.")
                }
            })
            .collect();

        let sink = Collect(std::sync::Mutex::new(Vec::new()));
        let streamed = analyzer().analyze_into(&responses, &tasks, &sink).unwrap();
        let batch = analyzer().analyze_batch(&responses, &tasks);

        assert_eq!(streamed.records, batch.records.len());
        assert_eq!(streamed.failures, batch.failures);
        assert_eq!(sink.0.into_inner().unwrap(), batch.records);
    }

    #[test]
    fn copies_task_context() {
        let t = task("wm-1", TaskCategory::WorkingMemory);
        let record = analyzer()
            .analyze(&Response::new("wm-1", "model-a", "Fine."), &t)
            .unwrap();
        assert_eq!(record.task_id, "wm-1");
        assert_eq!(record.model_name, "model-a");
        assert_eq!(record.category, TaskCategory::WorkingMemory);
        assert_eq!(record.subcategory, "test");
        assert_eq!(record.raw_length, 5);
        assert_eq!(record.sentence_count, 1);
    }

    #[test]
    fn extracts_working_memory_and_executive_signals() {
        let t = task("ef-1", TaskCategory::ExecutiveFunction);
        let text = "First, I will group the items into a set of three. \
                    As mentioned earlier, switching to the second list, I ignore the vowels. \
                    Now that the value changed, I update the total.";
        let record = analyzer()
            .analyze(&Response::new("ef-1", "m", text), &t)
            .unwrap();

        let wm = &record.working_memory_signals;
        assert!(wm[&WorkingMemorySignal::Sequential] >= 2.0); // first, second
        assert!(wm[&WorkingMemorySignal::Chunking] >= 2.0); // group, set of
        assert!(wm[&WorkingMemorySignal::Retention] >= 2.0); // as mentioned, earlier

        let ef = &record.executive_signals;
        assert!(ef[&ExecutiveSignal::TaskSwitching] > 0.0);
        assert!(ef[&ExecutiveSignal::Inhibition] > 0.0);
        assert!(ef[&ExecutiveSignal::Updating] > 0.0);

        assert!(record.meta_cognitive_signals[&MetaCognitiveSignal::Strategy] > 0.0);
    }

    #[test]
    fn numbered_outline_is_hierarchical() {
        let t = task("int-1", TaskCategory::Integration);
        let text = "The system consists of layers.\n\
                    1. Storage layer\n   a. Pages\n   b. Indexes\n\
                    2. Query layer\n   a. Planner\n";
        let record = analyzer()
            .analyze(&Response::new("int-1", "m", text), &t)
            .unwrap();
        assert_eq!(record.integration_label, IntegrationLabel::DeepHierarchical);
    }

    #[test]
    fn connective_heavy_text_is_associative() {
        let t = task("int-2", TaskCategory::Integration);
        let text = "Immune memory mirrors market learning. \
                    Just as antibodies adapt, prices adapt; this relates to feedback in both.";
        let record = analyzer()
            .analyze(&Response::new("int-2", "m", text), &t)
            .unwrap();
        assert_eq!(record.integration_label, IntegrationLabel::WebLikeAssociative);
    }

    #[test]
    fn step_sequence_is_linear() {
        let t = task("wm-2", TaskCategory::WorkingMemory);
        let text = "Add 17. Then multiply by two. Next subtract fifty. Then divide by three.";
        let record = analyzer()
            .analyze(&Response::new("wm-2", "m", text), &t)
            .unwrap();
        assert_eq!(record.integration_label, IntegrationLabel::LinearSequential);
    }

    #[test]
    fn batch_isolates_failures_and_keeps_order() {
        let tasks = TaskIndex::new(vec![
            task("a", TaskCategory::Reasoning),
            task("b", TaskCategory::Reasoning),
        ]);
        let mut broken = Response::new("b", "m", "");
        broken.raw_text = None;
        let responses = vec![
            Response::new("a", "m", "Thus it holds."),
            broken,
            Response::new("missing", "m", "Because."),
            Response::new("b", "m", "Generally yes."),
        ];
        let batch = analyzer().analyze_batch(&responses, &tasks);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].task_id, "a");
        assert_eq!(batch.records[1].task_id, "b");
        assert_eq!(
            batch.failures,
            vec![
                InputError::NonText {
                    task_id: "b".into(),
                    model_name: "m".into()
                },
                InputError::UnknownTask {
                    task_id: "missing".into(),
                    model_name: "m".into()
                },
            ]
        );
    }

    #[test]
    fn task_index_keeps_first_duplicate() {
        let mut second = task("a", TaskCategory::Integration);
        second.subcategory = "other".into();
        let index = TaskIndex::new(vec![task("a", TaskCategory::Reasoning), second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().category, TaskCategory::Reasoning);
    }
}
