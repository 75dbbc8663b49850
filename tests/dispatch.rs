// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/reply behaviour of the responder, one buffer at a time.

use modbus_responder::{
    decode_response, ExceptionCode, ExceptionResponse, FunctionCode, MemoryStore, Responder,
    Response, COIL_ON,
};

fn request(transaction_id: u16, unit_id: u8, function: u8, address: u16, value: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12);
    buf.extend_from_slice(&transaction_id.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x06, unit_id, function]);
    buf.extend_from_slice(&address.to_be_bytes());
    buf.extend_from_slice(&value.to_be_bytes());
    buf
}

fn seeded_responder() -> Responder<MemoryStore> {
    let mut store = MemoryStore::default();
    for address in 0..9 {
        store.set_holding_register(address, 0xA000 | address).unwrap();
        store.set_input_register(address, 0x0B00 | address).unwrap();
    }
    Responder::new(store)
}

#[test]
fn read_holding_registers_for_every_valid_range() {
    let mut responder = seeded_responder();
    for address in 0..9u16 {
        for quantity in 1..=(9 - address) {
            let reply = responder
                .handle(&request(0x0102, 0x11, 0x03, address, quantity))
                .unwrap();
            let byte_count = 2 * quantity as usize;
            assert_eq!(reply.len(), 9 + byte_count, "{address}/{quantity}");
            assert_eq!(&reply[..2], &[0x01, 0x02]);
            assert_eq!(reply[6], 0x11);
            assert_eq!(reply[7], 0x03);
            assert_eq!(usize::from(reply[8]), byte_count);
            let expected: Vec<u8> = (address..address + quantity)
                .flat_map(|a| (0xA000 | a).to_be_bytes())
                .collect();
            assert_eq!(&reply[9..], &expected[..], "{address}/{quantity}");
        }
    }
}

#[test]
fn read_ten_coils_masks_last_byte() {
    let mut responder = seeded_responder();
    for address in 0..23 {
        responder.store_mut().set_coil(address, true).unwrap();
    }
    let reply = responder.handle(&request(1, 1, 0x01, 0, 10)).unwrap();
    assert_eq!(
        &reply[..],
        &[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x01, 0x01, 0x02, 0xFF, 0x03,
        ]
    );
    assert_eq!(reply[10] & 0b1111_1100, 0);
}

#[test]
fn read_discrete_inputs() {
    let mut responder = seeded_responder();
    responder.store_mut().set_discrete_input(1, true).unwrap();
    responder.store_mut().set_discrete_input(3, true).unwrap();
    let reply = responder.handle(&request(9, 2, 0x02, 0, 4)).unwrap();
    assert_eq!(
        &reply[..],
        &[0x00, 0x09, 0x00, 0x00, 0x00, 0x04, 0x02, 0x02, 0x01, 0b1010]
    );
}

#[test]
fn zero_quantity_is_rejected_for_every_read() {
    let mut responder = seeded_responder();
    for function in 0x01..=0x04 {
        let reply = responder.handle(&request(7, 1, function, 0, 0)).unwrap();
        assert_eq!(&reply[..7], &[0x00, 0x07, 0x00, 0x00, 0x00, 0x03, 0x01]);
        assert_eq!(&reply[7..], &[0x80 | function, 0x03]);
    }
}

#[test]
fn out_of_range_reads_are_rejected() {
    let mut responder = seeded_responder();
    let reply = responder.handle(&request(1, 1, 0x04, 5, 5)).unwrap();
    assert_eq!(&reply[7..], &[0x84, 0x02]);
    let reply = responder.handle(&request(1, 1, 0x03, 0, 10)).unwrap();
    assert_eq!(&reply[7..], &[0x83, 0x03]);
    let reply = responder.handle(&request(1, 1, 0x02, 0, 5)).unwrap();
    assert_eq!(&reply[7..], &[0x82, 0x03]);
    let reply = responder.handle(&request(1, 1, 0x01, 0x0100, 1)).unwrap();
    assert_eq!(&reply[7..], &[0x81, 0x02]);
}

#[test]
fn write_single_coil_is_echoed() {
    let mut responder = seeded_responder();
    let req = request(0x4242, 1, 0x05, 0, COIL_ON);
    let reply = responder.handle(&req).unwrap();
    assert_eq!(&reply[..], &req[..]);
    assert_eq!(responder.store().coil(0), Some(true));

    let req = request(0x4243, 1, 0x05, 0, 0x0000);
    let reply = responder.handle(&req).unwrap();
    assert_eq!(&reply[..], &req[..]);
    assert_eq!(responder.store().coil(0), Some(false));
}

#[test]
fn write_single_coil_rejections() {
    let mut responder = seeded_responder();
    let reply = responder.handle(&request(1, 1, 0x05, 1, COIL_ON)).unwrap();
    assert_eq!(&reply[7..], &[0x85, 0x02]);
    let reply = responder.handle(&request(1, 1, 0x05, 3, 0x1234)).unwrap();
    assert_eq!(&reply[7..], &[0x85, 0x03]);
    assert_eq!(responder.store().coil(1), Some(false));
    assert_eq!(responder.store().coil(3), Some(false));
}

#[test]
fn unsupported_function_code() {
    let mut responder = seeded_responder();
    let reply = responder.handle(&request(3, 4, 0x06, 0, 1)).unwrap();
    assert_eq!(
        &reply[..],
        &[0x00, 0x03, 0x00, 0x00, 0x00, 0x03, 0x04, 0x86, 0x01]
    );
    let rsp = decode_response(&reply).unwrap();
    assert_eq!(
        rsp.result(),
        Err(&ExceptionResponse {
            function: FunctionCode::Unsupported(0x06),
            exception: ExceptionCode::IllegalFunction,
        })
    );
}

#[test]
fn unsupported_function_code_without_payload() {
    let mut responder = seeded_responder();
    let reply = responder
        .handle(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x01, 0x2B])
        .unwrap();
    assert_eq!(
        &reply[..],
        &[0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0xAB, 0x01]
    );
}

#[test]
fn header_fields_are_echoed() {
    let mut responder = seeded_responder();
    for transaction_id in [0x0000, 0x0001, 0x1234, 0xFFFF] {
        for unit_id in [0x00, 0x01, 0xFF] {
            let reply = responder
                .handle(&request(transaction_id, unit_id, 0x04, 0, 2))
                .unwrap();
            let rsp = decode_response(&reply).unwrap();
            assert_eq!(rsp.header().transaction_id, transaction_id);
            assert_eq!(rsp.header().unit_id, unit_id);
            assert_eq!(
                rsp.result(),
                Ok(&Response::ReadInputRegisters(vec![0x0B00, 0x0B01]))
            );
        }
    }
}

#[test]
fn repeated_reads_differ_only_in_transaction_id() {
    let mut responder = seeded_responder();
    let first = responder.handle(&request(1, 1, 0x03, 2, 4)).unwrap();
    let second = responder.handle(&request(2, 1, 0x03, 2, 4)).unwrap();
    assert_ne!(&first[..2], &second[..2]);
    assert_eq!(&first[2..], &second[2..]);
}

#[test]
fn malformed_frames_are_dropped() {
    let mut responder = seeded_responder();

    // oversized
    let mut req = request(1, 1, 0x03, 0, 1);
    req.push(0x00);
    assert!(responder.handle(&req).is_none());

    // too short for a function code
    assert!(responder
        .handle(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01])
        .is_none());

    // supported function code with a truncated payload
    assert!(responder
        .handle(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x01, 0x03, 0x00, 0x00])
        .is_none());

    // foreign protocol identifier
    let mut req = request(1, 1, 0x03, 0, 1);
    req[3] = 0x01;
    assert!(responder.handle(&req).is_none());

    // length field disagrees with the frame
    let mut req = request(1, 1, 0x03, 0, 1);
    req[5] = 0x07;
    assert!(responder.handle(&req).is_none());

    assert!(responder.handle(&[]).is_none());
}

#[test]
fn dropped_frames_leave_store_untouched() {
    let mut responder = seeded_responder();
    let mut req = request(1, 1, 0x05, 0, COIL_ON);
    req[2] = 0x01;
    assert!(responder.handle(&req).is_none());
    assert_eq!(responder.store().coil(0), Some(false));
}
