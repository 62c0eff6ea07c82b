//! The instructional prompt template and its fixed answer sentences.
//!
//! The template is a behavioral contract, not a suggestion: the model is
//! told to answer only from the supplied capture context and, when that
//! context is insufficient, to reply with [`INSUFFICIENT_DATA_ANSWER`]
//! verbatim. Downstream consumers rely on detecting that exact sentence
//! to distinguish "no answer" from "answer", so the constants here must
//! not be reworded casually.

/// The exact sentence the model must produce when the capture does not
/// support an answer.
pub const INSUFFICIENT_DATA_ANSWER: &str =
    "There is not enough data in the capture to answer precisely.";

/// Placeholder recorded as the turn's answer when generation fails. The
/// user's question is still appended to history alongside it.
pub const GENERATION_FAILURE_ANSWER: &str =
    "Sorry, an error occurred while processing your question.";

const TEMPLATE_HEADER: &str = "\
You are an expert in network traffic analysis and cyber security, focused on interpreting \
.pcap (packet capture) files. Your goal is to help the user understand what is happening in \
the captured traffic.

Based exclusively on the information extracted from the provided .pcap file (such as source \
and destination IPs, protocols used, packet contents, DNS, HTTP and TLS information, among \
others), answer the questions asked in an objective and precise way.

If the answer cannot be determined from the data available in the .pcap, say clearly:
\"There is not enough data in the capture to answer precisely.\"

You can answer questions such as:

    Which domains were accessed?
    Was there any suspicious communication?
    Was any unusual protocol used?
    Was there any data exfiltration attempt?
    Which User-Agent was used?
    Does any IP show anomalous behavior?
    How many packets were captured? (to answer this, count the packets in the .pcap file)
    What were the main protocols used?
    What were the main hosts involved?
    What were the main services accessed?

Never invent information. Always base your answer only on the data from the .pcap file.
";

/// Render the full prompt: instructions, retrieved context, paired chat
/// history, and the current question.
pub fn render_prompt(context: &str, history: &[(String, String)], question: &str) -> String {
    let mut out = String::with_capacity(
        TEMPLATE_HEADER.len() + context.len() + question.len() + 128,
    );
    out.push_str(TEMPLATE_HEADER);
    out.push_str("\n----------------\n");
    out.push_str(context);
    out.push_str("\n----------------\n");
    out.push_str("Chat history:\n");
    out.push_str(&render_history(history));
    out.push_str("----------------\n");
    out.push_str("Question: ");
    out.push_str(question);
    out.push_str("\nAnswer:\n");
    out
}

fn render_history(history: &[(String, String)]) -> String {
    let mut out = String::new();
    for (question, answer) in history {
        if !question.is_empty() {
            out.push_str("User: ");
            out.push_str(question);
            out.push('\n');
        }
        if !answer.is_empty() {
            out.push_str("Assistant: ");
            out.push_str(answer);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_the_exact_refusal_sentence() {
        let prompt = render_prompt("ctx", &[], "q");
        assert!(prompt.contains(INSUFFICIENT_DATA_ANSWER));
    }

    #[test]
    fn prompt_contains_context_history_and_question() {
        let history = vec![("first question".to_string(), "first answer".to_string())];
        let prompt = render_prompt("ip.src: 10.0.0.1", &history, "which hosts?");
        assert!(prompt.contains("ip.src: 10.0.0.1"));
        assert!(prompt.contains("User: first question"));
        assert!(prompt.contains("Assistant: first answer"));
        assert!(prompt.ends_with("Question: which hosts?\nAnswer:\n"));
    }

    #[test]
    fn empty_history_renders_empty_section() {
        let prompt = render_prompt("ctx", &[], "q");
        assert!(prompt.contains("Chat history:\n----------------"));
    }

    #[test]
    fn half_open_pairs_render_one_side_only() {
        let history = vec![("pending question".to_string(), String::new())];
        let rendered = render_history(&history);
        assert_eq!(rendered, "User: pending question\n");
    }
}
