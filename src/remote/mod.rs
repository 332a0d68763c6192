pub mod osc_sender;
