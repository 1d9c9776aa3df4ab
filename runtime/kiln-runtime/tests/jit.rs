///
/// Cranelift JIT Tests
///
/// Generates small functions that forward their parameters to a kiln stub,
/// finalizes them in a JIT module built by `kiln_runtime::jit`, and calls the
/// machine code directly. This checks that symbol registration, the declared
/// signatures and the Rust stub definitions agree.
///
/// Run all:  `cargo test -p kiln-runtime --test jit`
///

use cranelift::prelude::InstBuilder;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Linkage, Module};

use kiln_runtime::random::RandomGeneratorHolder;
use kiln_runtime::{handle, jit, registry, ExecutionContext, HolderSet, Literal, StubTable};

/// Define `forward_<stub>` with the stub's own signature, calling the stub.
fn forwarder(module: &mut JITModule, stubs: &StubTable, stub: &str) -> FuncId {
    let sig = jit::stub_signature(module, &registry::find(stub).unwrap());
    let func_id = module
        .declare_function(&format!("forward_{stub}"), Linkage::Local, &sig)
        .unwrap();
    let callee_id = stubs.func_id(stub).unwrap();

    let mut ctx = module.make_context();
    ctx.func.signature = sig;
    let mut builder_ctx = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut ctx.func, &mut builder_ctx);

    let entry = builder.create_block();
    builder.append_block_params_for_function_params(entry);
    builder.switch_to_block(entry);
    builder.seal_block(entry);

    let args = builder.block_params(entry).to_vec();
    let callee = module.declare_func_in_func(callee_id, builder.func);
    let call = builder.ins().call(callee, &args);
    let results = builder.inst_results(call).to_vec();
    builder.ins().return_(&results);
    builder.finalize();

    module.define_function(func_id, &mut ctx).unwrap();
    module.clear_context(&mut ctx);
    func_id
}

#[test]
fn jit_calls_holder_stub() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (mut module, stubs) = jit::new_jit_module().unwrap();
    let like = forwarder(&mut module, &stubs, "kiln_like_utf8_utf8");
    module.finalize_definitions().unwrap();

    let code = module.get_finalized_function(like);
    let like: extern "C" fn(i64, *const u8, i32) -> bool = unsafe { std::mem::transmute(code) };

    let mut holders = HolderSet::new();
    let h = holders.add("like", &[Literal::Null, Literal::Utf8("k_ln%".into())]).unwrap();
    assert!(like(h, b"kiln runtime".as_ptr(), 12));
    assert!(!like(h, b"kl".as_ptr(), 2));
}

#[test]
fn jit_calls_context_stub() {
    let (mut module, stubs) = jit::new_jit_module().unwrap();
    let length = forwarder(&mut module, &stubs, "kiln_char_length_utf8");
    let has_error = forwarder(&mut module, &stubs, "kiln_context_has_error");
    module.finalize_definitions().unwrap();

    let length: extern "C" fn(i64, *const u8, i32) -> i32 =
        unsafe { std::mem::transmute(module.get_finalized_function(length)) };
    let has_error: extern "C" fn(i64) -> bool =
        unsafe { std::mem::transmute(module.get_finalized_function(has_error)) };

    let ctx = ExecutionContext::new();
    let c = handle::to_handle(&ctx);
    let text = "héllo 字";
    assert_eq!(length(c, text.as_ptr(), text.len() as i32), 7);
    assert!(!has_error(c));

    assert_eq!(length(c, b"\xffabc".as_ptr(), 4), 0);
    assert!(has_error(c));
}

#[test]
fn jit_calls_float_returning_stub() {
    let (mut module, stubs) = jit::new_jit_module().unwrap();
    let random = forwarder(&mut module, &stubs, "kiln_random");
    module.finalize_definitions().unwrap();
    let random: extern "C" fn(i64) -> f64 = unsafe { std::mem::transmute(module.get_finalized_function(random)) };

    let jitted = RandomGeneratorHolder::with_seed(11);
    let direct = RandomGeneratorHolder::with_seed(11);
    for _ in 0..8 {
        assert_eq!(random(handle::to_handle(&jitted)), direct.call());
    }
}
