//! Delivery payloads for integration tests.

pub const HEADER: &str = "delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp";

/// Three deliveries a few blocks apart.
pub const THREE_DELIVERIES: &str = "\
delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp
1,40.7128,-74.0060,40.7140,-74.0070,2025-02-20 10:00:00
2,40.7130,-74.0050,40.7150,-74.0060,2025-02-20 10:05:00
3,40.7140,-74.0070,40.7128,-74.0060,2025-02-20 10:10:00
";

pub const SINGLE_A: &str = "\
delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp
1,40.7128,-74.0060,40.7140,-74.0070,2025-02-20 10:00:00
";

pub const SINGLE_B: &str = "\
delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp
2,40.7130,-74.0050,40.7150,-74.0060,2025-02-20 10:05:00
";

/// One batch across several UTM zones on both sides of the equator:
/// New York, Lima, Sao Paulo, Reykjavik, Bogota.
pub const CROSS_ZONE: &str = "\
delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp
1,40.7128,-74.0060,40.7306,-73.9352,2025-02-20 10:00:00
2,-12.0464,-77.0428,-12.1211,-77.0297,2025-02-20 10:05:00
3,-23.5505,-46.6333,-23.5629,-46.6544,2025-02-20 10:10:00
4,64.1466,-21.9426,64.1355,-21.8954,2025-02-20 10:15:00
5,4.7110,-74.0721,4.6097,-74.0817,2025-02-20 10:20:00
";

/// A header with no data rows.
pub fn header_only() -> String {
    format!("{HEADER}\n")
}

/// `n` deliveries with ids `first_id..first_id + n`, spread over roughly
/// 10 km x 10 km, one every 30 minutes.
pub fn generated(first_id: u64, n: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..n {
        let spread = |k: usize| ((i * k + 11) % 97) as f64 / 97.0 * 0.1;
        let minutes = i * 30;
        text.push_str(&format!(
            "\n{},{:.6},{:.6},{:.6},{:.6},2025-02-{:02} {:02}:{:02}:00",
            first_id + i as u64,
            40.70 + spread(37),
            -74.05 + spread(53),
            40.70 + spread(61),
            -74.05 + spread(29),
            20 + minutes / (24 * 60),
            (minutes / 60) % 24,
            minutes % 60,
        ));
    }
    text
}
