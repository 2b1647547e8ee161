pub mod web_agent;
