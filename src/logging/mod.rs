
// Logging side: fixed-rate sampler, durable CSV sink, and the best-effort
// receive trace that stays off the packet path.

pub mod csv_sink;
pub mod sampler;
pub mod trace;
