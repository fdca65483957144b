//! Turn orchestration.
//!
//! One explicit context object owns the classifier, session store,
//! retriever, reranker, synthesizer, router, and generation client.
//! Every turn moves through the same gate order: safety first, then
//! routing, then generation; memory is written only after a turn
//! completes. Crisis verdicts terminate the turn with fixed text —
//! no retrieval, no generation, no memory write.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, instrument, warn};

use crate::domain::error::AssistantResult;
use crate::domain::models::{
    ChatTurn, Config, SourceInfo, TurnEvent, TurnMessage, TurnMessageKind, TurnRequest,
    TurnResponse,
};
use crate::domain::ports::{ChatMessage, GenerationClient};
use crate::services::citations::CitationSynthesizer;
use crate::services::memory::{ChatMemory, SessionStore};
use crate::services::reranker::{RerankOutcome, Reranker};
use crate::services::retriever::HybridRetriever;
use crate::services::router::{QueryRouter, RouteDecision};
use crate::services::safety::SafetyClassifier;

/// Assistant persona and ground rules for conversational turns.
const SYSTEM_PROMPT_VI: &str = "Bạn là một Trợ lý AI hỗ trợ sức khỏe tâm thần. Nhiệm vụ của bạn:\n\
\n\
1. Giao tiếp với giọng điệu nhẹ nhàng, tôn trọng, hỗ trợ và không phán xét.\n\
2. Thu thập và làm rõ thông tin khi người dùng mô tả vấn đề tâm lý.\n\
3. Không được đưa ra chẩn đoán y khoa chính thức. Chỉ được cung cấp phân tích sơ bộ hoặc hướng dẫn an toàn.\n\
4. Với các dấu hiệu nguy cơ (tự hại, tuyệt vọng, ý định làm đau bản thân), hãy phản hồi khẩn cấp và hướng người dùng tìm sự giúp đỡ ngay lập tức.\n\
5. Giữ nội dung ngắn gọn, dễ hiểu, và luôn hỗ trợ lấy thêm thông tin từ người dùng.\n\
\n\
Mục tiêu: hỗ trợ người dùng hiểu rõ hơn về triệu chứng, cung cấp thông tin đáng tin cậy và khuyến khích họ tìm hỗ trợ từ chuyên gia khi cần thiết.";

/// Fixed emergency-resources message. Never model-generated.
pub const CRISIS_MESSAGE_VI: &str = "Mình rất lo lắng cho sự an toàn của bạn lúc này. \
Bạn không đơn độc, và luôn có người sẵn sàng giúp đỡ bạn ngay bây giờ:\n\
\n\
- Gọi 115 (cấp cứu) nếu bạn đang gặp nguy hiểm.\n\
- Đường dây nóng hỗ trợ tâm lý: 1900 636 446 (hoạt động 24/7).\n\
- Hãy liên hệ ngay với người thân hoặc người bạn tin tưởng ở gần bạn.\n\
\n\
Nếu có thể, đừng ở một mình lúc này. Sự sống của bạn rất quý giá.";

/// Fixed supportive preface queued ahead of the reply on warning turns.
pub const WARNING_MESSAGE_VI: &str = "Mình nhận thấy bạn đang trải qua giai đoạn khó khăn. \
Cảm xúc của bạn là có thật và đáng được lắng nghe. \
Nếu những cảm giác này kéo dài, bạn nên cân nhắc trò chuyện với chuyên gia tâm lý. \
Mình vẫn ở đây để lắng nghe bạn.";

/// Streaming channel depth; slow consumers exert backpressure on the
/// producer rather than buffering unboundedly.
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Events of one streaming turn.
pub type TurnStream = ReceiverStream<TurnEvent>;

/// The assistant's turn pipeline.
pub struct ChatOrchestrator {
    classifier: SafetyClassifier,
    store: SessionStore,
    retriever: HybridRetriever,
    reranker: Reranker,
    synthesizer: CitationSynthesizer,
    router: QueryRouter,
    generation: Arc<dyn GenerationClient>,
}

impl ChatOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: SafetyClassifier,
        store: SessionStore,
        retriever: HybridRetriever,
        reranker: Reranker,
        synthesizer: CitationSynthesizer,
        router: QueryRouter,
        generation: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            classifier,
            store,
            retriever,
            reranker,
            synthesizer,
            router,
            generation,
        }
    }

    /// Wire the full pipeline from config and the four backend ports.
    pub fn from_parts(
        config: &Config,
        generation: Arc<dyn GenerationClient>,
        dense: Arc<dyn crate::domain::ports::PassageIndex>,
        lexical: Arc<dyn crate::domain::ports::PassageIndex>,
        relevance: Arc<dyn crate::domain::ports::RelevanceModel>,
    ) -> Self {
        Self::new(
            SafetyClassifier::new(generation.clone(), config.safety.clone()),
            SessionStore::new(config.memory.clone()),
            HybridRetriever::new(dense, lexical, config.retrieval.clone()),
            Reranker::new(relevance, config.retrieval.clone()),
            CitationSynthesizer::new(generation.clone(), config.retrieval.clone()),
            QueryRouter::new(),
            generation,
        )
    }

    /// Run one complete turn and return the ordered messages.
    #[instrument(skip(self, request), fields(session = ?request.session_id))]
    pub async fn chat(&self, request: TurnRequest) -> AssistantResult<TurnResponse> {
        let verdict = self.classifier.classify(&request.message).await;
        let (session_id, memory) = self.store.get_or_create(request.session_id.as_deref()).await;

        if verdict.is_crisis() {
            info!(session_id, "crisis verdict, short-circuiting turn");
            return Ok(TurnResponse {
                session_id,
                messages: vec![TurnMessage {
                    kind: TurnMessageKind::Crisis,
                    text: CRISIS_MESSAGE_VI.to_string(),
                }],
                sources: Vec::new(),
                safety: verdict,
            });
        }

        let mut messages = Vec::new();
        if verdict.is_warning() {
            messages.push(TurnMessage {
                kind: TurnMessageKind::Warning,
                text: WARNING_MESSAGE_VI.to_string(),
            });
        }

        let (answer, sources) = match self.router.route(&request.message) {
            RouteDecision::Grounded => self.grounded_answer(&request.message).await?,
            RouteDecision::Conversational => {
                let answer = self.conversational_answer(&request.message, &memory).await?;
                (answer, Vec::new())
            }
        };

        {
            let mut memory = memory.lock().await;
            memory.push(ChatTurn::user(&request.message));
            memory.push(ChatTurn::assistant(&answer));
        }

        messages.push(TurnMessage { kind: TurnMessageKind::Reply, text: answer });
        Ok(TurnResponse { session_id, messages, sources, safety: verdict })
    }

    /// Run one turn as an ordered event stream.
    ///
    /// Event order: `Safety`, optional `Crisis`/`Warning`, `Token`*,
    /// `Sources`, `Done`. A generation failure after streaming started
    /// emits `Error` then `Done`. Dropping the returned stream cancels
    /// the producer at its next send, which stops token generation.
    pub async fn chat_stream(&self, request: TurnRequest) -> AssistantResult<TurnStream> {
        let verdict = self.classifier.classify(&request.message).await;
        let (session_id, memory) = self.store.get_or_create(request.session_id.as_deref()).await;

        let (tx, rx) = mpsc::channel::<TurnEvent>(STREAM_CHANNEL_CAPACITY);

        if tx.send(TurnEvent::Safety { verdict: verdict.clone() }).await.is_err() {
            return Ok(ReceiverStream::new(rx));
        }

        if verdict.is_crisis() {
            info!(session_id, "crisis verdict, short-circuiting stream");
            let _ = tx.send(TurnEvent::Crisis { text: CRISIS_MESSAGE_VI.to_string() }).await;
            let _ = tx.send(TurnEvent::Done { session_id }).await;
            return Ok(ReceiverStream::new(rx));
        }

        if verdict.is_warning()
            && tx
                .send(TurnEvent::Warning { text: WARNING_MESSAGE_VI.to_string() })
                .await
                .is_err()
        {
            return Ok(ReceiverStream::new(rx));
        }

        // Resolve the route and prepare the token stream before spawning
        // so construction-time failures propagate as errors rather than
        // stream events.
        let (token_stream, sources) = match self.router.route(&request.message) {
            RouteDecision::Grounded => self.grounded_stream(&request.message).await?,
            RouteDecision::Conversational => {
                let stream = self.conversational_stream(&request.message, &memory).await?;
                (stream, Vec::new())
            }
        };

        let message = request.message.clone();
        tokio::spawn(async move {
            let mut token_stream = token_stream;
            let mut answer = String::new();
            let mut failed = false;

            while let Some(delta) = token_stream.next().await {
                match delta {
                    Ok(text) => {
                        answer.push_str(&text);
                        if tx.send(TurnEvent::Token { text }).await.is_err() {
                            // Receiver dropped: stop generating.
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "generation failed mid-stream");
                        failed = true;
                        if tx
                            .send(TurnEvent::Error { message: err.to_string() })
                            .await
                            .is_err()
                        {
                            return;
                        }
                        break;
                    }
                }
            }

            if !failed {
                if tx.send(TurnEvent::Sources { sources }).await.is_err() {
                    return;
                }
                let mut memory = memory.lock().await;
                memory.push(ChatTurn::user(&message));
                memory.push(ChatTurn::assistant(&answer));
            }

            let _ = tx.send(TurnEvent::Done { session_id }).await;
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Grounded one-shot path: retrieve → rerank → synthesize.
    async fn grounded_answer(&self, query: &str) -> AssistantResult<(String, Vec<SourceInfo>)> {
        let fused = self.retriever.retrieve(query).await?;
        let response = match self.reranker.rerank_and_filter(query, fused).await? {
            RerankOutcome::Grounded(reranked) => self.synthesizer.synthesize(query, &reranked).await?,
            RerankOutcome::Fallback => self.synthesizer.fallback_response(),
        };
        Ok((response.answer, response.sources))
    }

    /// Grounded streaming path; the fallback becomes a single-token stream.
    async fn grounded_stream(
        &self,
        query: &str,
    ) -> AssistantResult<(crate::domain::ports::TokenStream, Vec<SourceInfo>)> {
        let fused = self.retriever.retrieve(query).await?;
        match self.reranker.rerank_and_filter(query, fused).await? {
            RerankOutcome::Grounded(reranked) => {
                let (stream, sources) = self.synthesizer.synthesize_stream(query, &reranked).await?;
                Ok((stream, sources))
            }
            RerankOutcome::Fallback => {
                let fallback = self.synthesizer.fallback_response();
                let stream: crate::domain::ports::TokenStream =
                    Box::pin(futures::stream::once(async move { Ok(fallback.answer) }));
                Ok((stream, Vec::new()))
            }
        }
    }

    /// Conversational path: one chat completion over the session history.
    async fn conversational_answer(
        &self,
        message: &str,
        memory: &Arc<tokio::sync::Mutex<ChatMemory>>,
    ) -> AssistantResult<String> {
        let messages = self.history_messages(message, memory).await;
        let answer = self.generation.chat(&messages).await?;
        Ok(answer)
    }

    async fn conversational_stream(
        &self,
        message: &str,
        memory: &Arc<tokio::sync::Mutex<ChatMemory>>,
    ) -> AssistantResult<crate::domain::ports::TokenStream> {
        let messages = self.history_messages(message, memory).await;
        let stream = self.generation.stream_chat(&messages).await?;
        Ok(stream)
    }

    /// System prompt, compressed summaries, raw history, then the new
    /// user message.
    async fn history_messages(
        &self,
        message: &str,
        memory: &Arc<tokio::sync::Mutex<ChatMemory>>,
    ) -> Vec<ChatMessage> {
        let memory = memory.lock().await;
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT_VI)];
        for summary in memory.summaries() {
            messages.push(ChatMessage::system(summary));
        }
        for turn in memory.turns() {
            messages.push(ChatMessage {
                role: turn.role.as_str().to_string(),
                content: turn.text.clone(),
            });
        }
        messages.push(ChatMessage::user(message));
        messages
    }

    // Session lifecycle.

    pub async fn new_session(&self) -> String {
        self.store.create().await.0
    }

    pub async fn end_session(&self, session_id: &str) -> bool {
        self.store.end(session_id).await
    }

    pub async fn active_sessions(&self) -> Vec<String> {
        self.store.list_active().await
    }

    pub async fn clear_sessions(&self) -> usize {
        self.store.clear_all().await
    }
}
