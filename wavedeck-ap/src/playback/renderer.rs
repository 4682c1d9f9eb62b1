//! Real-time block renderer
//!
//! The [`Renderer`] runs on the audio thread. It renders fixed-size blocks
//! of `block_size` frames and hands them out one frame at a time to the
//! device callback. Per block it:
//! 1. Loads the active cycle and applies pending processor commands
//! 2. Reads source frames from the cycle's buffer (linear interpolation at
//!    the current playback rate) and multiplies them by the envelope gain
//! 3. Runs the block processor, which transforms frames and advances the
//!    position while it is below `floor(loop_end)`
//! 4. Publishes the position and pushes progress/boundary events
//! 5. Advances the frame clock
//!
//! Nothing here allocates, locks or logs. Abnormal conditions (no cycle,
//! full event ring, reads past the buffer) produce silence or drop the
//! event.

use crate::audio::AudioFrame;
use crate::playback::clock::{Clock, FrameClock};
use crate::playback::cycle::CycleSlot;
use crate::playback::envelope::GainSchedule;
use crate::playback::events::{ProcessorCommand, RenderEvent};
use crate::playback::vocal_canceler::{cancel_frame, VocalCanceler};
use arc_swap::ArcSwap;
use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::Arc;

/// One block as seen by a [`BlockProcessor`]
///
/// Inputs are the enveloped source frames. Outputs start zeroed; frames
/// the processor leaves untouched are silent.
pub struct BlockContext<'a> {
    pub input_left: &'a [f32],
    pub input_right: &'a [f32],
    pub output_left: &'a mut [f32],
    pub output_right: &'a mut [f32],
    /// Position in seconds before the next frame
    pub position: f64,
    /// Seconds added per advanced frame
    pub step: f64,
    /// `floor(loop_end)`; frames are in range while `position < boundary`
    pub boundary: f64,
    /// Vocal canceler depth snapshot for this block
    pub depth: f32,
    advanced: usize,
}

impl BlockContext<'_> {
    pub fn len(&self) -> usize {
        self.input_left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_left.is_empty()
    }

    pub fn in_range(&self) -> bool {
        self.position < self.boundary
    }

    /// Move the position forward by one frame
    pub fn advance(&mut self) {
        self.position += self.step;
        self.advanced += 1;
    }

    /// Frames advanced so far this block
    pub fn advanced(&self) -> usize {
        self.advanced
    }

    /// Vocal-cancel one input frame at this block's depth
    #[inline]
    pub fn cancel(&self, index: usize) -> (f32, f32) {
        cancel_frame(self.input_left[index], self.input_right[index], self.depth)
    }
}

/// Per-block processing strategy
///
/// Any `FnMut(&mut BlockContext)` closure is a processor.
pub trait BlockProcessor: Send {
    fn process(&mut self, block: &mut BlockContext<'_>);
}

impl<F> BlockProcessor for F
where
    F: FnMut(&mut BlockContext<'_>) + Send,
{
    fn process(&mut self, block: &mut BlockContext<'_>) {
        self(block)
    }
}

/// Built-in processor: vocal-cancel and advance each in-range frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformAndAdvance;

impl BlockProcessor for TransformAndAdvance {
    fn process(&mut self, block: &mut BlockContext<'_>) {
        for i in 0..block.len() {
            if !block.in_range() {
                break;
            }
            let (left, right) = block.cancel(i);
            block.output_left[i] = left;
            block.output_right[i] = right;
            block.advance();
        }
    }
}

/// Shared handles a renderer is built from
pub(crate) struct RendererParts {
    pub cycles: CycleSlot,
    pub schedule: Arc<ArcSwap<GainSchedule>>,
    pub canceler: Arc<VocalCanceler>,
    pub clock: FrameClock,
    pub events: HeapProd<RenderEvent>,
    pub commands: HeapCons<ProcessorCommand>,
    pub block_size: usize,
    pub output_sample_rate: u32,
}

/// Audio-thread half of the engine
pub struct Renderer {
    cycles: CycleSlot,
    schedule: Arc<ArcSwap<GainSchedule>>,
    canceler: Arc<VocalCanceler>,
    clock: FrameClock,
    events: HeapProd<RenderEvent>,
    commands: HeapCons<ProcessorCommand>,
    custom: Option<Box<dyn BlockProcessor>>,
    block_size: usize,
    output_sample_rate: u32,
    input_left: Vec<f32>,
    input_right: Vec<f32>,
    output_left: Vec<f32>,
    output_right: Vec<f32>,
    /// Next frame of the current block to hand out
    cursor: usize,
    /// Generation of the cycle the source cursor belongs to
    generation: u64,
    /// Read position in the buffer, in (fractional) source frames
    source_frame: f64,
    boundary_sent: bool,
}

impl Renderer {
    pub(crate) fn new(parts: RendererParts) -> Self {
        let block_size = parts.block_size.max(1);
        Self {
            cycles: parts.cycles,
            schedule: parts.schedule,
            canceler: parts.canceler,
            clock: parts.clock,
            events: parts.events,
            commands: parts.commands,
            custom: None,
            block_size,
            output_sample_rate: parts.output_sample_rate.max(1),
            input_left: vec![0.0; block_size],
            input_right: vec![0.0; block_size],
            output_left: vec![0.0; block_size],
            output_right: vec![0.0; block_size],
            cursor: block_size,
            generation: 0,
            source_frame: 0.0,
            boundary_sent: false,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

    /// Set the device rate; call before the stream starts
    pub fn set_output_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate > 0 {
            self.output_sample_rate = sample_rate;
        }
    }

    /// Next output frame, rendering a new block when the current one is used up
    #[inline]
    pub fn next_frame(&mut self) -> AudioFrame {
        if self.cursor >= self.block_size {
            self.render_block();
            self.cursor = 0;
        }
        let frame = AudioFrame::new(self.output_left[self.cursor], self.output_right[self.cursor]);
        self.cursor += 1;
        frame
    }

    /// Fill `frames` with output
    pub fn fill(&mut self, frames: &mut [AudioFrame]) {
        for frame in frames {
            *frame = self.next_frame();
        }
    }

    /// Render exactly one block and return its stereo output
    ///
    /// Discards any frames left over from a partially consumed block.
    pub fn render_next_block(&mut self) -> (&[f32], &[f32]) {
        self.render_block();
        self.cursor = self.block_size;
        (&self.output_left, &self.output_right)
    }

    fn render_block(&mut self) {
        let block_size = self.block_size;
        let out_rate = self.output_sample_rate as f64;
        let block_start = self.clock.now();

        self.output_left.fill(0.0);
        self.output_right.fill(0.0);

        // Load the cycle before draining commands: a command pushed for a
        // new cycle is always visible once that cycle is.
        let guard = self.cycles.load();
        drain_commands(&mut self.commands, &mut self.custom, &mut self.events);

        if let Some(cycle) = guard.as_ref() {
            let buffer = &cycle.buffer;
            let buffer_rate = buffer.sample_rate() as f64;

            if cycle.generation != self.generation {
                self.generation = cycle.generation;
                self.source_frame = cycle.window_start * buffer_rate;
                self.boundary_sent = false;
            }

            let schedule = self.schedule.load();
            let stopped = cycle.is_stopped();
            // A stopped cycle only sounds while its release ramp runs
            let tail_done = stopped && schedule.release.map_or(true, |r| block_start >= r.end);

            if !tail_done {
                let rate = cycle.playback_rate();
                let source_step = rate * buffer_rate / out_rate;
                let source_end = cycle.loop_end * buffer_rate;

                for i in 0..block_size {
                    let frame = if self.source_frame < source_end {
                        buffer.frame_at(self.source_frame)
                    } else {
                        AudioFrame::zero()
                    };
                    let gain = schedule.gain_at(block_start + i as f64 / out_rate);
                    self.input_left[i] = frame.left * gain;
                    self.input_right[i] = frame.right * gain;
                    self.source_frame += source_step;
                }

                let depth = self.canceler.depth();

                if stopped {
                    // Release tail: transform only, position frozen
                    for i in 0..block_size {
                        let (left, right) = cancel_frame(self.input_left[i], self.input_right[i], depth);
                        self.output_left[i] = left;
                        self.output_right[i] = right;
                    }
                } else {
                    let start_position = cycle.position();
                    let step = rate / out_rate;
                    let boundary = cycle.boundary();

                    let mut block = BlockContext {
                        input_left: &self.input_left,
                        input_right: &self.input_right,
                        output_left: &mut self.output_left,
                        output_right: &mut self.output_right,
                        position: start_position,
                        step,
                        boundary,
                        depth,
                        advanced: 0,
                    };

                    match self.custom.as_mut() {
                        Some(processor) => processor.process(&mut block),
                        None => TransformAndAdvance.process(&mut block),
                    }

                    let position = block.position;
                    let frames = block.advanced;
                    cycle.store_position(position);

                    if frames > 0 {
                        let _ = self.events.try_push(RenderEvent::Progress {
                            generation: cycle.generation,
                            start_position,
                            step,
                            frames,
                        });
                    }

                    if position >= boundary && !self.boundary_sent {
                        self.boundary_sent = self
                            .events
                            .try_push(RenderEvent::Boundary { generation: cycle.generation })
                            .is_ok();
                    }
                }
            }
        }

        self.clock.advance_frames(block_size, self.output_sample_rate);
    }
}

/// Apply processor commands; replaced processors go back to the engine
fn drain_commands(
    commands: &mut HeapCons<ProcessorCommand>,
    custom: &mut Option<Box<dyn BlockProcessor>>,
    events: &mut HeapProd<RenderEvent>,
) {
    while let Some(command) = commands.try_pop() {
        let replaced = match command {
            ProcessorCommand::Install(processor) => custom.replace(processor),
            ProcessorCommand::UseDefault => custom.take(),
        };
        if let Some(old) = replaced {
            // If the ring is full the box is dropped here; rare enough to accept
            let _ = events.try_push(RenderEvent::Retired(old));
        }
    }
}
