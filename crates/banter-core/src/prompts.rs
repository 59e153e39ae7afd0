//! Fixed prompts steering the model.

/// System prompt applied to a chat until an admin sets their own.
/// Also the normalization target for blank `/set_prompt` input.
pub const DEFAULT_PROMPT: &str = "You are the resident bot of this group chat. \
Give short, practical answers, and never pass up a chance for a dry, sarcastic \
remark about the question. Emoticons are welcome.";

/// Instruction used to rewrite a user's free-form text into an image prompt
/// before it is sent to the image backend.
pub const IMAGE_PROMPT: &str = "Rewrite the user's message as a short English \
prompt for an image generation model. Describe the subject, setting, style, \
and mood in plain words. Reply with the prompt text only.";

/// Instruction for the /tldr chat-log summary. The message body is a chat log,
/// one message per line: id | reply_to | sender | timestamp | text.
pub const SUMMARIZE_PROMPT: &str = "The following is a chat log, one message \
per line in the form: id | reply_to | sender | timestamp | text. Summarize the \
discussion in a few short paragraphs, naming who argued what. Answer in the \
language the chat is written in.";
