use std::io::Read;

use libc::sbrk;
use rallocator::{Heap, LibcOs};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
/// The program break is the upper boundary of the heap managed by the segment arena.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  env_logger::init();

  // The heap holds a segment arena (grown via `sbrk`) and a mapped arena (individual
  // `mmap` regions), both carved into best-fit blocks.
  let mut heap = Heap::new(LibcOs);

  unsafe {
    // Initial heap state: nothing allocated yet, no segment grown.
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate space for a u32 (4 bytes). First allocation ever grows the
    //    segment arena by its prelude in one `sbrk` call.
    // --------------------------------------------------------------------
    let first_block = heap.allocate(4).expect("non-zero request");
    println!("\n[1] Allocate 4 bytes (u32)");
    println!("[1] ptr = {:?}", first_block);

    let first_ptr = first_block.as_ptr().cast::<u32>();
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written to first_block = 0x{:X}", first_ptr.read());

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Allocate 12 bytes. Shows the split guard leaving a free remainder
    //    behind the carved block.
    // --------------------------------------------------------------------
    let second_block = heap.allocate(12).expect("non-zero request");
    println!("\n[2] Allocate 12 bytes");
    println!("[2] ptr = {:?}", second_block);

    let second_ptr = second_block.as_ptr();
    second_ptr.write_bytes(0xAB, 12);
    println!("[2] Initialized second block with 0xAB");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Allocate a u64 to show payload alignment (ALIGNMENT == 8 by default).
    // --------------------------------------------------------------------
    let third_block = heap.allocate(8).expect("non-zero request");
    println!("\n[3] Allocate 8 bytes (u64)");
    println!("[3] ptr = {:?}", third_block);

    let third_ptr = third_block.as_ptr().cast::<u64>();
    third_ptr.write(0x1122334455667788);
    println!("[3] Value written = 0x{:X}", third_ptr.read());

    let addr_third = third_block.as_ptr() as usize;
    println!("[3] Address = {:#X}, addr % 8 = {}", addr_third, addr_third % 8);

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Allocate an array of u16 (32 bytes) to force more list traversal.
    // --------------------------------------------------------------------
    let fourth_block = heap.allocate(32).expect("non-zero request");
    println!("\n[4] Allocate 32 bytes ([u16; 16])");
    println!("[4] ptr = {:?}", fourth_block);

    let fourth_ptr = fourth_block.as_ptr().cast::<u16>();
    for i in 0..16 {
      fourth_ptr.add(i).write(i as u16);
    }
    println!("[4] Wrote 0..15 into the u16 array");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Free the first block. Unlike a pure bump allocator, this block's
    //    status flips to FREE and becomes a best-fit candidate immediately.
    // --------------------------------------------------------------------
    heap.free(Some(first_block));
    println!("\n[5] Freed first_block at {:?}", first_block);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 6) Allocate a small block (2 bytes) to see if best-fit reuses the
    //    freed block instead of growing the segment.
    // --------------------------------------------------------------------
    let fifth_block = heap.allocate(2).expect("non-zero request");
    println!("\n[6] Allocate 2 bytes (check reuse of freed block)");
    println!("[6] ptr = {:?}", fifth_block);

    println!(
      "[6] fifth_block == first_block? {}",
      if fifth_block == first_block {
        "Yes, best-fit reused the freed block"
      } else {
        "No, it landed somewhere else"
      }
    );

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 7) Allocate a large block to cross the mapped-arena threshold. This
    //    goes straight to `mmap` and leaves the program break untouched.
    // --------------------------------------------------------------------
    print_program_break("before large alloc");

    let big_block = heap.allocate(256 * 1024).expect("non-zero request");
    println!("\n[7] Allocate 256 KiB block (mapped arena)");
    println!("[7] ptr = {:?}", big_block);

    print_program_break("after large alloc");
    heap.free(Some(big_block));
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 8) End of demo. The segment arena's memory is reclaimed by the OS on
    //    exit; the mapped region above was already unmapped explicitly.
    // --------------------------------------------------------------------
    println!("\n[8] End of example. Process will exit and the OS will reclaim the rest.");
  }
}
