#[derive(Debug, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

pub fn calculate_stats(data: &[f64]) -> Option<Stats> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let len = sorted.len();
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    };
    let mean = sorted.iter().sum::<f64>() / len as f64;
    let std_dev = (sorted.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / len as f64).sqrt();
    Some(Stats {
        min: sorted[0],
        max: sorted[len - 1],
        mean,
        median,
        std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_empty_is_none() {
        assert_eq!(calculate_stats(&[]), None);
    }

    #[test]
    fn stats_of_odd_sample() {
        let stats = calculate_stats(&[0.9, 1.0, 0.8]).unwrap();
        assert_eq!(stats.min, 0.8);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.median, 0.9);
        assert!((stats.mean - 0.9).abs() < 1e-12);
    }

    #[test]
    fn stats_of_even_sample() {
        let stats = calculate_stats(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.5);
        assert!((stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
    }
}
