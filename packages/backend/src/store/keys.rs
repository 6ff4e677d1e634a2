pub const PROFILE: &str = "profile";
pub const RL_STATE: &str = "rl-state";
pub const WRONG_SUBMISSIONS: &str = "wrong-submissions";
pub const AI_QUESTIONS: &str = "ai-questions";
