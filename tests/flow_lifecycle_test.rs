#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod lifecycle {
    use cabinet_configurator::{
        DeviceEvent, WindowEvent,
        context::Context,
        flow::{FlowConstructor, GraphicsFlow, ImageTestResult, Out},
        render::Render,
    };
    use std::time::Duration;

    use crate::common::test_utils::Lifecycle;

    enum Event {
        DoorToggled,
    }

    /// Flow 0: emits the event and hands it on untouched.
    struct Relay;

    /// Flow 1: consumes what the relay passed on.
    struct Sink;

    fn quiet<S, E>() -> Out<S, E> {
        Out::Empty
    }

    impl GraphicsFlow<Lifecycle, Event> for Relay {
        fn on_init(&mut self, ctx: &mut Context, state: &mut Lifecycle) -> Out<Lifecycle, Event> {
            ctx.clear_colour = wgpu::Color::TRANSPARENT;
            assert_eq!(state.inits, 0, "the relay runs first");
            assert_eq!(state.frames, 0);
            state.inits += 1;
            Out::Empty
        }

        fn on_click(&mut self, _: &Context, state: &mut Lifecycle, _: u32) -> Out<Lifecycle, Event> {
            state.clicks += 1;
            Out::Empty
        }

        fn on_update(&mut self, _: &Context, state: &mut Lifecycle, _: Duration) -> Out<Lifecycle, Event> {
            assert_eq!(state.inits, 2, "every flow is initialised before the first frame");
            state.frames += 1;
            match state.frames {
                // a load that never finishes must not hold up the frames after it
                2 => Out::FutEvent(vec![Box::new(futures::future::pending::<Event>())]),
                3 => Out::FutEvent(vec![Box::new(async move { Event::DoorToggled })]),
                5 => {
                    let open: Box<dyn FnOnce(&mut Lifecycle)> = Box::new(|state: &mut Lifecycle| state.note("door opened"));
                    let oak: Box<dyn FnOnce(&mut Lifecycle)> = Box::new(|state: &mut Lifecycle| state.note("oak selected"));
                    Out::FutFn(vec![Box::new(async move { open }), Box::new(async move { oak })])
                }
                _ => Out::Empty,
            }
        }

        fn on_device_events(&mut self, _: &Context, _: &mut Lifecycle, _: &DeviceEvent) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_window_events(&mut self, _: &Context, _: &mut Lifecycle, _: &WindowEvent) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_custom_events(&mut self, _: &Context, state: &mut Lifecycle, event: Event) -> Option<Event> {
            assert!(state.frames >= 3, "sent in frame 3");
            state.note("relay saw the toggle");
            Some(event)
        }

        fn on_render(&self) -> Render<'_> {
            Render::None
        }

        fn render_to_texture(
            &self,
            _: &Context,
            _: &mut Lifecycle,
            _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            Ok(ImageTestResult::Passed)
        }
    }

    impl GraphicsFlow<Lifecycle, Event> for Sink {
        fn on_init(&mut self, _: &mut Context, state: &mut Lifecycle) -> Out<Lifecycle, Event> {
            assert_eq!(state.inits, 1);
            state.inits += 1;
            Out::Empty
        }

        fn on_click(&mut self, _: &Context, _: &mut Lifecycle, _: u32) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_update(&mut self, _: &Context, _: &mut Lifecycle, _: Duration) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_device_events(&mut self, _: &Context, _: &mut Lifecycle, _: &DeviceEvent) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_window_events(&mut self, _: &Context, _: &mut Lifecycle, _: &WindowEvent) -> Out<Lifecycle, Event> {
            quiet()
        }

        fn on_custom_events(&mut self, _: &Context, state: &mut Lifecycle, event: Event) -> Option<Event> {
            match event {
                Event::DoorToggled => state.note("sink consumed the toggle"),
            }
            None
        }

        fn on_render(&self) -> Render<'_> {
            Render::None
        }

        fn render_to_texture(
            &self,
            _: &Context,
            state: &mut Lifecycle,
            _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            // events arrive a frame or two after they were emitted
            let delivered = state.position("sink consumed the toggle").is_some();
            if state.frames <= 6 || (!delivered && state.frames < 30) {
                return Ok(ImageTestResult::Waiting);
            }
            let relayed = state.position("relay saw the toggle");
            let consumed = state.position("sink consumed the toggle");
            assert!(relayed.is_some() && relayed < consumed, "{:?}", state.journal);
            assert!(state.position("door opened").is_some(), "{:?}", state.journal);
            assert!(state.position("oak selected").is_some(), "{:?}", state.journal);
            assert_eq!(state.journal.len(), 4, "{:?}", state.journal);
            assert_eq!(state.clicks, 0);
            Ok(ImageTestResult::Passed)
        }
    }

    fn boxed(flow: impl GraphicsFlow<Lifecycle, Event> + 'static) -> FlowConstructor<Lifecycle, Event> {
        let flow: Box<dyn GraphicsFlow<Lifecycle, Event>> = Box::new(flow);
        Box::new(move |_| Box::pin(async move { flow }))
    }

    #[test]
    fn hooks_run_in_order_and_events_pass_between_flows() {
        if let Err(e) = cabinet_configurator::flow::run(vec![boxed(Relay), boxed(Sink)]) {
            panic!("{}", e);
        }
    }
}
