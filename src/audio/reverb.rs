//! Schroeder reverb: parallel feedback combs into series allpasses.
//!
//! Comb feedback is derived from the decay time so every comb falls by
//! 60 dB after `decay` seconds.

const COMB_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_MS: [f32; 2] = [5.0, 1.7];
const ALLPASS_GAIN: f32 = 0.5;

#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    index: usize,
}

impl DelayLine {
    fn new(sample_rate: u32, ms: f32) -> Self {
        let len = ((ms / 1000.0) * sample_rate as f32) as usize;
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    fn read(&self) -> f32 {
        self.buffer[self.index]
    }

    fn write_and_advance(&mut self, value: f32) {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % self.buffer.len();
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Reverb {
    combs: Vec<(DelayLine, f32)>,
    allpasses: Vec<DelayLine>,
}

impl Reverb {
    pub(crate) fn new(sample_rate: u32, decay: f32) -> Self {
        let combs = COMB_MS
            .iter()
            .map(|&ms| {
                let feedback = 10f32.powf(-3.0 * (ms / 1000.0) / decay);
                (DelayLine::new(sample_rate, ms), feedback)
            })
            .collect();
        let allpasses = ALLPASS_MS
            .iter()
            .map(|&ms| DelayLine::new(sample_rate, ms))
            .collect();
        Self { combs, allpasses }
    }

    /// Fully wet output for `input`, same length
    pub(crate) fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let scale = 1.0 / self.combs.len() as f32;
        input
            .iter()
            .map(|&x| {
                let mut y = 0.0;
                for (line, feedback) in &mut self.combs {
                    let delayed = line.read();
                    line.write_and_advance(x + delayed * *feedback);
                    y += delayed;
                }
                y *= scale;

                for line in &mut self.allpasses {
                    let delayed = line.read();
                    line.write_and_advance(y + delayed * ALLPASS_GAIN);
                    y = delayed - y;
                }
                y
            })
            .collect()
    }
}
