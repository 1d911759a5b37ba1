/*
Schroeder Reverb
================

Four feedback comb filters in parallel build the decaying tail, two allpass
filters in series smear it into a dense wash:

    in ─┬─ comb 29.7ms ─┐
        ├─ comb 37.1ms ─┤
        ├─ comb 41.1ms ─┼─ /4 ─ allpass 5.0ms ─ allpass 1.7ms ─ out
        └─ comb 43.7ms ─┘

Comb delays are mutually prime-ish so their echoes do not stack up into a
metallic ring. Each comb low-passes its own feedback (damping), which makes
high frequencies die out first like in a real room.

Delay lines are sized from the sample rate once at construction; processing
never allocates.
*/

const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Circular buffer of fixed length.
struct DelayLine {
    buffer: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    fn from_millis(ms: f32, sample_rate: f32) -> Self {
        let len = ((ms * sample_rate / 1000.0) as usize).max(1);
        Self {
            buffer: vec![0.0; len],
            pos: 0,
        }
    }

    /// Oldest sample in the line.
    #[inline]
    fn read(&self) -> f32 {
        self.buffer[self.pos]
    }

    /// Overwrite the oldest sample and advance.
    #[inline]
    fn write(&mut self, value: f32) {
        self.buffer[self.pos] = value;
        self.pos = (self.pos + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

struct Comb {
    line: DelayLine,
    damped: f32,
}

impl Comb {
    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.line.read();
        self.damped = out * (1.0 - damp) + self.damped * damp;
        self.line.write(input + self.damped * feedback);
        out
    }
}

struct Allpass {
    line: DelayLine,
}

impl Allpass {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read();
        let out = delayed - ALLPASS_FEEDBACK * input;
        self.line.write(input + ALLPASS_FEEDBACK * out);
        out
    }
}

pub struct SchroederReverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    feedback: f32,
    damp: f32,
}

impl SchroederReverb {
    pub fn new(sample_rate: f32) -> Self {
        let combs = COMB_DELAYS_MS
            .iter()
            .map(|&ms| Comb {
                line: DelayLine::from_millis(ms, sample_rate),
                damped: 0.0,
            })
            .collect();
        let allpasses = ALLPASS_DELAYS_MS
            .iter()
            .map(|&ms| Allpass {
                line: DelayLine::from_millis(ms, sample_rate),
            })
            .collect();

        let mut reverb = Self {
            combs,
            allpasses,
            feedback: 0.0,
            damp: 0.5,
        };
        reverb.set_room_size(0.5);
        reverb
    }

    /// 0.0 (small room) to 1.0 (large hall); maps to comb feedback 0.7..0.98.
    pub fn set_room_size(&mut self, size: f32) {
        self.feedback = 0.7 + size.clamp(0.0, 1.0) * 0.28;
    }

    /// 0.0 (bright) to 1.0 (dark).
    pub fn set_damping(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    /// Wet output for one input sample.
    pub fn process(&mut self, input: f32) -> f32 {
        let (feedback, damp) = (self.feedback, self.damp);
        let mut out = self
            .combs
            .iter_mut()
            .map(|comb| comb.process(input, feedback, damp))
            .sum::<f32>()
            * 0.25;

        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.line.clear();
            comb.damped = 0.0;
        }
        for allpass in &mut self.allpasses {
            allpass.line.clear();
        }
    }
}
