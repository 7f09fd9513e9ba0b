//! Granular overlap-add pitch shifting and time stretching.

/*
Granular Resynthesis
====================

Playing a recording faster raises its pitch, playing it slower lowers it -
speed and pitch are welded together on a tape machine. To change them
independently we cut the recording into short overlapping slices ("grains"),
and decide separately:

  - HOW FAST we walk through the recording  → tempo
  - HOW FAST each grain is played back      → pitch

Vocabulary
----------

  read head     Position in the source (in source samples) that new grains
                start from. Advances by `rate_step` per output sample, so
                rate 0.5 takes twice as long to get through the song.

  grain         A short window of the source played back on its own. Each
                grain reads the source at `pitch_step` samples per output
                sample: 2^(cents / 1200), times any sample rate conversion.

  grain size    Output time between two grain launches (default 180 ms).

  overlap       Extra time each grain keeps sounding while the next one fades
                in (default 100 ms). Grains last `grain size + overlap`.


The Timeline
------------

    grain k-1  ───────────────────╲
                                   ╲  (fade out over `overlap`)
    grain k              ╱──────────────────────╲
                        ╱ (fade in)               ╲
    grain k+1                           ╱──────────────────
                        |<─ grain size ─>|
    launch:   k-1       k               k+1

Fade-out of one grain and fade-in of the next are linear and complementary,
so their sum stays at unity during the crossfade. With overlap ≤ grain size
at most two grains sound at once.


Why Pitch and Tempo Stay Independent
------------------------------------

Tempo only moves the read head, which decides WHERE in the song the next
grain starts. Pitch only sets how quickly samples are read inside a grain.
Neither parameter appears in the other's formula.

For a 440 Hz source:

    rate 1.0, pitch ×2.0  → 880 Hz, original length
    rate 0.5, pitch ×1.0  → 440 Hz, twice as long
    rate 1.5, pitch ×0.5  → 220 Hz, two thirds of the length


Implementation Notes
--------------------

The grain pool is a fixed array, so rendering never allocates. The first
grain after `start` skips its fade-in; otherwise every seek would begin with
a 100 ms swell. Reads past the end of the source produce silence.
*/

/// Grains held in the fixed pool (two sound at once, the rest is slack).
pub const MAX_GRAINS: usize = 4;

#[derive(Clone, Copy, Debug, Default)]
struct Grain {
    active: bool,
    // source position, in source samples
    pos: f64,
    age: usize,
    len: usize,
    fade_in: bool,
}

/// Granular pitch/time engine reading from a borrowed source buffer.
pub struct GrainShifter {
    grains: [Grain; MAX_GRAINS],
    grain_len: usize,
    overlap_len: usize,
    until_next: usize,
    read_head: f64,
    first_grain: bool,
}

impl GrainShifter {
    /// `grain_size` and `overlap` in seconds, at the output `sample_rate`.
    pub fn new(grain_size: f32, overlap: f32, sample_rate: f32) -> Self {
        let mut shifter = Self {
            grains: [Grain::default(); MAX_GRAINS],
            grain_len: 1,
            overlap_len: 0,
            until_next: 0,
            read_head: 0.0,
            first_grain: true,
        };
        shifter.set_timing(grain_size, overlap, sample_rate);
        shifter
    }

    pub fn set_timing(&mut self, grain_size: f32, overlap: f32, sample_rate: f32) {
        self.grain_len = ((grain_size * sample_rate).round() as usize).max(1);
        self.overlap_len = ((overlap.max(0.0) * sample_rate).round() as usize).min(self.grain_len);
    }

    pub fn grain_len(&self) -> usize {
        self.grain_len
    }

    pub fn overlap_len(&self) -> usize {
        self.overlap_len
    }

    /// Restart from `position` (source samples). Sounding grains are dropped.
    pub fn start(&mut self, position: f64) {
        self.stop();
        self.read_head = position.max(0.0);
        self.until_next = 0;
        self.first_grain = true;
    }

    pub fn stop(&mut self) {
        for grain in &mut self.grains {
            grain.active = false;
        }
    }

    pub fn read_head(&self) -> f64 {
        self.read_head
    }

    pub fn active_grains(&self) -> usize {
        self.grains.iter().filter(|g| g.active).count()
    }

    /// True once the read head has passed the end and every grain has faded.
    pub fn is_finished(&self, source_len: usize) -> bool {
        self.read_head >= source_len as f64 && self.active_grains() == 0
    }

    /// Overwrite `out` with the next block.
    ///
    /// `rate_step` advances the read head per output sample (tempo),
    /// `pitch_step` advances each grain per output sample (pitch). Both
    /// already include any source/output sample rate ratio.
    pub fn render(&mut self, source: &[f32], out: &mut [f32], rate_step: f64, pitch_step: f64) {
        let source_len = source.len() as f64;
        let overlap = self.overlap_len;

        for frame in out.iter_mut() {
            if self.until_next == 0 {
                if self.read_head < source_len {
                    self.launch();
                }
                self.until_next = self.grain_len;
            }

            let mut sum = 0.0_f32;
            for grain in self.grains.iter_mut().filter(|g| g.active) {
                let w = window(grain.age, grain.len, overlap, grain.fade_in);
                sum += read_interpolated(source, grain.pos) * w;

                grain.pos += pitch_step;
                grain.age += 1;
                if grain.age >= grain.len {
                    grain.active = false;
                }
            }
            *frame = sum;

            self.read_head += rate_step;
            self.until_next -= 1;
        }
    }

    fn launch(&mut self) {
        let grain = Grain {
            active: true,
            pos: self.read_head,
            age: 0,
            len: self.grain_len + self.overlap_len,
            fade_in: !self.first_grain,
        };
        self.first_grain = false;

        // Free slot first, otherwise steal the oldest grain.
        let slot = self
            .grains
            .iter()
            .position(|g| !g.active)
            .or_else(|| {
                self.grains
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, g)| g.age)
                    .map(|(i, _)| i)
            })
            .unwrap_or(0);
        self.grains[slot] = grain;
    }
}

#[inline]
fn window(age: usize, len: usize, overlap: usize, fade_in: bool) -> f32 {
    if overlap == 0 {
        return 1.0;
    }
    if fade_in && age < overlap {
        return age as f32 / overlap as f32;
    }
    let fade_out_start = len.saturating_sub(overlap);
    if age >= fade_out_start {
        return (len - age) as f32 / overlap as f32;
    }
    1.0
}

#[inline]
fn read_interpolated(source: &[f32], pos: f64) -> f32 {
    if pos < 0.0 {
        return 0.0;
    }
    let i = pos as usize;
    let frac = (pos - i as f64) as f32;
    match (source.get(i), source.get(i + 1)) {
        (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
        (Some(&a), None) => a,
        _ => 0.0,
    }
}

/// Playback ratio for a detune in cents: 2^(cents / 1200).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f64 {
    2.0_f64.powf(cents as f64 / 1200.0)
}
