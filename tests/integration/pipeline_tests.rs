/*!
 * End-to-end tests of the annotation pipeline over scripted ports
 */

use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use lexiflow::annotation::{
    CandidateChunk, ChunkType, DetectionSource, ExtractedText, Phase, PhraseSource, ProgressSnapshot,
    StaticVocabulary,
};
use lexiflow::errors::ChunkError;
use lexiflow::{AnnotationError, AnnotationPipeline, CancellationToken, PipelineConfig};

use crate::common::{BrokenPhraseSource, FixedPhraseSource, RecordingPort, init_test_logging};

fn pipeline_with(port: RecordingPort, config: PipelineConfig) -> AnnotationPipeline {
    init_test_logging();
    AnnotationPipeline::new(config, Arc::new(port))
}

/// Run `pipeline` and collect every snapshot it reports
async fn annotate_collecting(
    pipeline: &AnnotationPipeline,
    input: &ExtractedText,
    target: &str,
) -> (Result<lexiflow::AnnotationResult, AnnotationError>, Vec<ProgressSnapshot>) {
    let snapshots = Mutex::new(Vec::new());
    let on_progress = |snapshot: &ProgressSnapshot| {
        snapshots.lock().unwrap().push(snapshot.clone());
    };
    let result = pipeline
        .annotate(input, target, Some(&on_progress), &CancellationToken::new())
        .await;
    (result, snapshots.into_inner().unwrap())
}

struct PanickingPhraseSource;

#[async_trait]
impl PhraseSource for PanickingPhraseSource {
    async fn propose(&self, _text: &str, _language: &str) -> Result<Vec<CandidateChunk>, ChunkError> {
        panic!("phrase source crashed");
    }
}

#[tokio::test]
async fn test_annotate_sameLanguage_shouldSimplifyWithIdenticalRenderings() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let pipeline = pipeline_with(port, PipelineConfig::default())
        .with_phrase_source(Arc::new(FixedPhraseSource::new(&["ran quickly"])));
    let input = ExtractedText::new("The cat ran quickly.").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "en", None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.simplify_mode);
    assert_eq!(result.chunks.len(), 1);
    let chunk = &result.chunks[0];
    assert_eq!((chunk.start, chunk.end), (8, 19));
    assert_eq!(chunk.text, "ran quickly");
    assert_eq!(chunk.translation.literal, "simple(ran quickly)");
    assert_eq!(chunk.translation.literal, chunk.translation.contextual);
    assert!(!chunk.translation.differs);
    assert_eq!(stats.simplify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.literal_calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.metrics.simplify.successes, 1);
}

#[tokio::test]
async fn test_annotate_shortChineseText_shouldDetectByScriptAndTranslate() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let pipeline = pipeline_with(port, PipelineConfig::default());

    let result = pipeline
        .annotate(&ExtractedText::new("你好世界"), "en", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.detected_language, "zh");
    assert_eq!(result.metrics.detection_source, Some(DetectionSource::ScriptHeuristic));
    assert!(!result.simplify_mode);
    assert_eq!(result.metrics.segments_total, 1);
    assert_eq!(result.chunks.len(), 1);
    assert_eq!(result.chunks[0].text, "你好世界");
    assert_eq!(result.chunks[0].translation.literal, "lit(你好世界)");
    // The chunk is the whole segment, so no contextual call is made
    assert_eq!(stats.contextual_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_annotate_withFailingChunk_shouldEchoSourceAndKeepOthers() {
    let port = RecordingPort::new().failing_on("obscure term");
    let pipeline = pipeline_with(port, PipelineConfig::default())
        .with_phrase_source(Arc::new(FixedPhraseSource::new(&["The cat", "obscure term", "sat"])));
    let input = ExtractedText::new("The cat saw an obscure term and sat.").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "fr", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 3);
    let failed = &result.chunks[1];
    assert_eq!(failed.text, "obscure term");
    assert_eq!(failed.translation.literal, "obscure term");
    assert_eq!(failed.translation.contextual, "obscure term");
    assert!(!failed.translation.differs);

    let first = &result.chunks[0];
    assert_eq!(first.translation.literal, "lit(The cat)");
    assert_eq!(first.translation.contextual, "ctx(The cat)");
    assert!(first.translation.differs);

    assert_eq!(result.metrics.literal.failures, 1);
    assert_eq!(result.metrics.literal.successes, 2);
    assert_eq!(result.metrics.contextual.calls, 2);
}

#[tokio::test]
async fn test_annotate_withLockedBackend_shouldUsePlaceholder() {
    let port = RecordingPort::new().locked_on("dog");
    let config = PipelineConfig::default().with_max_phrase_words(1);
    let pipeline = pipeline_with(port, config);
    let input = ExtractedText::new("cat dog").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "de", None, &CancellationToken::new())
        .await
        .unwrap();

    let dog = result.chunks.iter().find(|c| c.text == "dog").unwrap();
    assert_eq!(dog.translation.literal, "[dog]");
    assert_eq!(dog.translation.contextual, "[dog]");
    assert_eq!(result.metrics.literal.interaction_required, 1);
}

#[tokio::test]
async fn test_annotate_whenContextualEchoesLiteral_shouldNotDiffer() {
    let port = RecordingPort::new().echoing_literal();
    let pipeline = pipeline_with(port, PipelineConfig::default());
    let input = ExtractedText::new("The old man walked slowly to the market.").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "es", None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.chunks.is_empty());
    for chunk in &result.chunks {
        assert_eq!(chunk.translation.literal, chunk.translation.contextual);
        assert!(!chunk.translation.differs);
    }
}

#[tokio::test]
async fn test_annotate_withBatchWidth_shouldBoundCallsInFlight() {
    let port = RecordingPort::new().with_delay(Duration::from_millis(10));
    let stats = port.stats.clone();
    let config = PipelineConfig::default().with_batch_width(2).with_max_phrase_words(1);
    let pipeline = pipeline_with(port, config);
    let input = ExtractedText::new("one two three four five six seven").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "fr", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 7);
    assert_eq!(stats.max_in_flight(), 2);
    let texts: Vec<&str> = result.chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three", "four", "five", "six", "seven"]);
}

#[tokio::test]
async fn test_annotate_cancelledAfterPrechunk_shouldMakeNoPortCalls() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let pipeline = pipeline_with(port, PipelineConfig::default());
    let input = ExtractedText::new("The dog sleeps in the garden.").with_declared_language("en");

    let cancel = CancellationToken::new();
    let phases = Mutex::new(Vec::new());
    let on_progress = |snapshot: &ProgressSnapshot| {
        phases.lock().unwrap().push(snapshot.phase);
        if snapshot.phase == Phase::Prechunk {
            cancel.cancel();
        }
    };

    let result = pipeline.annotate(&input, "fr", Some(&on_progress), &cancel).await;

    assert_eq!(result.unwrap_err(), AnnotationError::Cancelled);
    assert_eq!(stats.total_calls(), 0);
    assert_eq!(
        phases.into_inner().unwrap(),
        vec![Phase::Detect, Phase::Segment, Phase::Prechunk]
    );
}

#[tokio::test]
async fn test_annotate_cancelledAfterFirstWindow_shouldStopBeforeNextWindow() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let config = PipelineConfig::default().with_batch_width(2).with_max_phrase_words(1);
    let pipeline = pipeline_with(port, config);
    let input = ExtractedText::new("one two three four five six seven").with_declared_language("en");

    let cancel = CancellationToken::new();
    let on_progress = |snapshot: &ProgressSnapshot| {
        if snapshot.phase == Phase::Translate {
            cancel.cancel();
        }
    };

    let result = pipeline.annotate(&input, "fr", Some(&on_progress), &cancel).await;

    assert_eq!(result.unwrap_err(), AnnotationError::Cancelled);
    assert_eq!(stats.literal_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_annotate_georgianDocument_shouldTranslateEveryWord() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let config = PipelineConfig::default().with_max_phrase_words(1);
    let pipeline = pipeline_with(port, config);
    let input = ExtractedText::new("გამარჯობა მსოფლიო").with_declared_language("ka");

    let result = pipeline
        .annotate(&input, "en", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.detected_language, "ka");
    assert_eq!(result.metrics.target_segments, 1);
    let texts: Vec<&str> = result.chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["გამარჯობა", "მსოფლიო"]);
    assert!(result.chunks.iter().all(|c| c.chunk_type == ChunkType::Word));
    assert_eq!(result.chunks[0].translation.literal, "lit(გამარჯობა)");
    assert_eq!(stats.literal_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_annotate_undeclaredBengali_shouldDetectAndTranslate() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let pipeline = pipeline_with(port, PipelineConfig::default());
    let input = ExtractedText::new("আমি প্রতিদিন সকালে বাজারে যাই এবং তাজা সবজি কিনি");

    let result = pipeline
        .annotate(&input, "en", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.detected_language, "bn");
    assert!(!result.simplify_mode);
    assert_eq!(result.metrics.target_segments, 1);
    assert!(result.chunks.iter().all(|c| c.chunk_type != ChunkType::Foreign));
    assert!(stats.literal_calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_annotate_progressSnapshots_shouldGrowMonotonically() {
    let config = PipelineConfig::default().with_batch_width(2);
    let pipeline = pipeline_with(RecordingPort::new(), config);
    let input = ExtractedText::new(
        "The children played in the park after school, and their parents watched from the benches.",
    )
    .with_declared_language("en");

    let (result, snapshots) = annotate_collecting(&pipeline, &input, "fr").await;
    let result = result.unwrap();

    assert!(snapshots.len() >= 4);
    for pair in snapshots.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        assert!(later.chunks.len() >= earlier.chunks.len());
        assert_eq!(&later.chunks[..earlier.chunks.len()], &earlier.chunks[..]);
        assert!(later.phase >= earlier.phase);
        assert!(!earlier.is_complete);
    }

    let prechunk = snapshots.iter().find(|s| s.phase == Phase::Prechunk).unwrap();
    assert!(prechunk.total_expected_chunks.is_some());
    assert!(snapshots.iter().any(|s| s.phase == Phase::Translate));

    let last = snapshots.last().unwrap();
    assert!(last.is_complete);
    assert_eq!(last.phase, Phase::Finalize);
    assert_eq!(last.chunks, result.chunks);
    assert_eq!(last.total_expected_chunks, Some(result.chunks.len()));
}

#[tokio::test]
async fn test_annotate_mixedScripts_shouldComposeGlobalOffsets() {
    let pipeline = pipeline_with(RecordingPort::new(), PipelineConfig::default());
    let input = ExtractedText::new("Bonjour 世界 hello").with_declared_language("fr");

    let (result, snapshots) = annotate_collecting(&pipeline, &input, "en").await;
    let result = result.unwrap();

    for chunk in &result.chunks {
        assert_eq!(&result.plain_text[chunk.start..chunk.end], chunk.text);
    }
    let foreign = result.chunks.iter().find(|c| c.text == "世界").unwrap();
    assert_eq!(foreign.chunk_type, ChunkType::Foreign);
    assert_eq!((foreign.start, foreign.end), (8, 14));
    assert_eq!(foreign.translation.literal, "世界");
    assert_eq!(foreign.language.as_deref(), Some("zh"));

    let hello = result.chunks.iter().find(|c| c.text == "hello").unwrap();
    assert_eq!((hello.start, hello.end), (15, 20));
    assert_eq!(hello.translation.literal, "lit(hello)");

    let prechunk = snapshots.iter().find(|s| s.phase == Phase::Prechunk).unwrap();
    assert_eq!(prechunk.total_expected_chunks, Some(result.chunks.len()));
}

#[tokio::test]
async fn test_annotate_withBrokenPhraseSource_shouldDegradeSegments() {
    let port = RecordingPort::new();
    let stats = port.stats.clone();
    let pipeline = pipeline_with(port, PipelineConfig::default()).with_phrase_source(Arc::new(BrokenPhraseSource));
    let input = ExtractedText::new("Hello Привет world").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "fr", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.metrics.degraded_segments, 2);
    assert_eq!(stats.total_calls(), 0);
    let hello = &result.chunks[0];
    assert_eq!(hello.text, "Hello");
    assert_eq!(hello.chunk_type, ChunkType::Phrase);
    assert_eq!(hello.translation.literal, "Hello");
    let rebuilt: String = result.chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(rebuilt, result.plain_text);
}

#[tokio::test]
async fn test_annotate_withPanickingPhraseSource_shouldDegradeInsteadOfFailing() {
    let pipeline =
        pipeline_with(RecordingPort::new(), PipelineConfig::default()).with_phrase_source(Arc::new(PanickingPhraseSource));
    let input = ExtractedText::new("A quiet morning.").with_declared_language("en");

    let result = pipeline
        .annotate(&input, "it", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.metrics.degraded_segments, 1);
    assert_eq!(result.chunks.len(), 1);
    assert_eq!(result.chunks[0].text, "A quiet morning.");
}

#[tokio::test]
async fn test_annotate_withScriptOnlyMarkup_shouldRejectInput() {
    let pipeline = pipeline_with(RecordingPort::new(), PipelineConfig::default());
    let input = ExtractedText::new("<script>var x = 1;</script><br/>");

    let result = pipeline.annotate(&input, "en", None, &CancellationToken::new()).await;
    assert!(matches!(result, Err(AnnotationError::InvalidInput(_))));
}

#[tokio::test]
async fn test_annotateStreaming_shouldSendEverySnapshot() {
    let pipeline = pipeline_with(RecordingPort::new(), PipelineConfig::default());
    let input = ExtractedText::new("Le chat dort sur le canapé.").with_declared_language("fr");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = pipeline
        .annotate_streaming(&input, "en", tx, &CancellationToken::new())
        .await
        .unwrap();

    let mut received = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        received.push(snapshot);
    }
    assert!(received.len() >= 4);
    assert_eq!(received[0].phase, Phase::Detect);
    let last = received.last().unwrap();
    assert!(last.is_complete);
    assert_eq!(last.chunks.len(), result.chunks.len());
}

#[tokio::test]
async fn test_annotate_withVocabulary_shouldTagKnownWords() {
    let vocabulary = StaticVocabulary::new().with_word("Cat", "en", 3);
    let config = PipelineConfig::default().with_max_phrase_words(1);
    let pipeline = pipeline_with(RecordingPort::new(), config).with_vocabulary(Arc::new(vocabulary));
    let input = ExtractedText::new("cat dog").with_declared_language("en-US");

    let result = pipeline
        .annotate(&input, "fr", None, &CancellationToken::new())
        .await
        .unwrap();

    let cat = result.chunks.iter().find(|c| c.text == "cat").unwrap();
    let dog = result.chunks.iter().find(|c| c.text == "dog").unwrap();
    assert_eq!(cat.known_level, Some(3));
    assert_eq!(dog.known_level, None);
}
