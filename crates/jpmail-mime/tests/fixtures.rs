//! End-to-end decoding of real-world Japanese messages.
//!
//! The same sentence arrives in every combination of legacy and modern
//! charset with each transfer encoding; all of them must decode to
//! identical text.

use jpmail_mime::{
    Charset, Error, Headers, TransferEncoding, assemble_message, decode_body, decode_header,
    read_message,
};

const SENTENCE: &str = "サイトを更新した状態に保つことはセキュリティにとって重要です。\
それはまた、あなたとあなたの読者にとってインターネットをより安全な場所にすることでもあります。\n";

const SUBJECT: &str = "【テスト環境】サイト更新が完了しました";

const PLAIN_UTF8: &str = concat!(
    "To: Another Gopher <to@example.com>\n",
    "Subject: Gophers at Gophercon\n",
    "Date: Mon, 23 Jun 2015 11:40:36 -0400\n",
    "From: Gopher <from@example.com>\n",
    "MIME-Version: 1.0\n",
    "Content-Type: text/plain; charset=\"UTF-8\"\n",
    "\n",
    "Message body\n",
);

const ISO2022JP_7BIT: &str = concat!(
    "To: Another Gopher <to@example.com>\n",
    "Subject: =?ISO-2022-JP?B?GyRCIVolRiU5JUg0RDYtIVslNSUkJUg5OT83JCw0ME47JDckXiQ3JD8bKEI=?=\n",
    "Date: Tue, 15 Sep 2015 16:17:23 +0000\n",
    "From: Gopher <from@example.com>\n",
    "MIME-Version: 1.0\n",
    "Content-Type: text/plain; charset=ISO-2022-JP\n",
    "\n",
    "\x1b$B%5%$%H$r99?7$7$?>uBV$KJ]$D$3$H$O%;%-%e%j%F%#$K$H$C$F=EMW$G$9!#$=$l$O$^$?!\"$\"$J$?$H$\"$J$?$NFI<T$K$H$C$F%$%s%?!<%M%C%H$r$h$j0BA4$J>l=j$K$9$k$3$H$G$b$\"$j$^$9!#\x1b(B\n",
);

const ISO2022JP_QP: &str = concat!(
    "To: Another Gopher <to@example.com>\n",
    "Subject: =?ISO-2022-JP?B?GyRCIVolRiU5JUg0RDYtIVslNSUkJUg5OT83JCw0ME47JDckXiQ3JD8bKEI=?=\n",
    "Date: Tue, 15 Sep 2015 16:17:23 +0000\n",
    "From: Gopher <from@example.com>\n",
    "MIME-Version: 1.0\n",
    "Content-Type: text/plain; charset=ISO-2022-JP\n",
    "Content-Transfer-Encoding: quoted-printable\n",
    "\n",
    "=1B=24B=255=25=24=25H=24r99=3F7=247=24=3F=3EuBV=24KJ=5D=24D=243=24H=24O=25=3B=25=2D=25e=25j=25F=25=23=24K=24H=24C=24F=3DEMW=24G=249=21=23=24=3D=24l=24O=24=5E=24=3F=21=22=24=22=24J=24=3F=24H=24=22=24J=24=3F=24NFI=3CT=24K=24H=24C=24F=25=24=25s=25=3F=21=3C=25M=25C=25H=24r=24h=24j0BA4=24J=3El=3Dj=24K=249=24k=243=24H=24G=24b=24=22=24j=24=5E=249=21=23=1B=28B\n",
);

const UTF8_BASE64: &str = concat!(
    "MIME-Version: 1.0\n",
    "Content-Type: text/plain; charset=\"utf-8\"\n",
    "Content-Transfer-Encoding: base64\n",
    "To: Another Gopher <to@example.com>\n",
    "Subject: Gophers at Gophercon\n",
    "Date: Mon, 23 Jun 2015 11:40:36 -0400\n",
    "From: Gopher <from@example.com>\n",
    "\n",
    "44K144Kk44OI44KS5pu05paw44GX44Gf54q25oWL44Gr5L+d44Gk44GT44Go44Gv44K744Kt\n",
    "44Ol44Oq44OG44Kj44Gr44Go44Gj44Gm6YeN6KaB44Gn44GZ44CC44Gd44KM44Gv44G+44Gf\n",
    "44CB44GC44Gq44Gf44Go44GC44Gq44Gf44Gu6Kqt6ICF44Gr44Go44Gj44Gm44Kk44Oz44K/\n",
    "44O844ON44OD44OI44KS44KI44KK5a6J5YWo44Gq5aC05omA44Gr44GZ44KL44GT44Go44Gn\n",
    "44KC44GC44KK44G+44GZ44CCCg==%\n",
);

const UTF8_QP: &str = concat!(
    "To: Another Gopher <to@example.com>\n",
    "Subject: Gophers at Gophercon\n",
    "From: Gopher <from@example.com>\n",
    "Date: Fri, 18 Sep 2015 17:51:01 +0900\n",
    "Content-Type: text/plain; charset=UTF-8\n",
    "Content-Transfer-Encoding: quoted-printable\n",
    "Content-Disposition: inline\n",
    "MIME-Version: 1.0\n",
    "\n",
    "=E3=82=B5=E3=82=A4=E3=83=88=E3=82=92=E6=9B=B4=E6=96=B0=E3=81=97=E3=81=9F=\n",
    "=E7=8A=B6=E6=85=8B=E3=81=AB=E4=BF=9D=E3=81=A4=E3=81=93=E3=81=A8=E3=81=AF=\n",
    "=E3=82=BB=E3=82=AD=E3=83=A5=E3=83=AA=E3=83=86=E3=82=A3=E3=81=AB=E3=81=A8=\n",
    "=E3=81=A3=E3=81=A6=E9=87=8D=E8=A6=81=E3=81=A7=E3=81=99=E3=80=82=E3=81=9D=\n",
    "=E3=82=8C=E3=81=AF=E3=81=BE=E3=81=9F=E3=80=81=E3=81=82=E3=81=AA=E3=81=9F=\n",
    "=E3=81=A8=E3=81=82=E3=81=AA=E3=81=9F=E3=81=AE=E8=AA=AD=E8=80=85=E3=81=AB=\n",
    "=E3=81=A8=E3=81=A3=E3=81=A6=E3=82=A4=E3=83=B3=E3=82=BF=E3=83=BC=E3=83=8D=\n",
    "=E3=83=83=E3=83=88=E3=82=92=E3=82=88=E3=82=8A=E5=AE=89=E5=85=A8=E3=81=AA=\n",
    "=E5=A0=B4=E6=89=80=E3=81=AB=E3=81=99=E3=82=8B=E3=81=93=E3=81=A8=E3=81=A7=\n",
    "=E3=82=82=E3=81=82=E3=82=8A=E3=81=BE=E3=81=99=E3=80=82\n",
);

#[test]
fn test_plain_utf8_body() {
    let message = assemble_message(PLAIN_UTF8.as_bytes()).unwrap();
    assert_eq!(message.body_text(), Some("Message body\n"));
    assert_eq!(message.subject(), "Gophers at Gophercon");
    assert_eq!(message.from().display_name, "Gopher");
    assert_eq!(message.from().address, "from@example.com");
    assert_eq!(message.to().len(), 1);
    assert_eq!(message.to()[0].display_name, "Another Gopher");
    assert_eq!(message.to()[0].address, "to@example.com");
}

#[test]
fn test_every_fixture_decodes_to_the_same_sentence() {
    let fixtures = [
        (ISO2022JP_7BIT, TransferEncoding::SevenBit),
        (ISO2022JP_QP, TransferEncoding::QuotedPrintable),
        (UTF8_BASE64, TransferEncoding::Base64),
        (UTF8_QP, TransferEncoding::QuotedPrintable),
    ];

    for (raw, encoding) in fixtures {
        let message = assemble_message(raw.as_bytes()).unwrap();
        let text = message.text().unwrap();
        assert_eq!(text.text(), Some(SENTENCE));
        assert_eq!(text.transfer_encoding, encoding);
        assert_eq!(text.media_type, "text/plain");
        assert!(message.html().is_none());
        assert!(message.attachments().is_empty());
        assert!(message.resources().is_empty());
    }
}

#[test]
fn test_iso2022jp_subject() {
    for raw in [ISO2022JP_7BIT, ISO2022JP_QP] {
        let message = assemble_message(raw.as_bytes()).unwrap();
        assert_eq!(message.subject(), SUBJECT);
    }
}

#[test]
fn test_dates() {
    let message = assemble_message(ISO2022JP_QP.as_bytes()).unwrap();
    let date = message.date().unwrap();
    assert_eq!(date.to_rfc2822(), "Tue, 15 Sep 2015 16:17:23 +0000");

    let message = assemble_message(UTF8_QP.as_bytes()).unwrap();
    assert_eq!(message.date().unwrap().offset().local_minus_utc(), 9 * 3600);

    // The weekday in this fixture does not match the date.
    let message = assemble_message(PLAIN_UTF8.as_bytes()).unwrap();
    assert_eq!(
        message.date().unwrap().to_rfc2822(),
        "Tue, 23 Jun 2015 11:40:36 -0400"
    );
}

#[test]
fn test_crlf_line_endings() {
    let raw = UTF8_QP.replace('\n', "\r\n");
    let message = assemble_message(raw.as_bytes()).unwrap();
    assert_eq!(message.body_text(), Some(SENTENCE.replace('\n', "\r\n").as_str()));
}

#[test]
fn test_unsupported_charset_is_reported() {
    let raw = PLAIN_UTF8.replace("charset=\"UTF-8\"", "charset=x-nonexistent");
    let err = assemble_message(raw.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedCharset(ref name) if name == "x-nonexistent"));
    assert!(!err.is_header_error());
}

#[test]
fn test_cp932_label() {
    // "テスト" in Shift_JIS.
    let mut raw = b"From: a@example.jp\nContent-Type: text/plain; charset=CP932\n\n".to_vec();
    raw.extend_from_slice(&[0x83, 0x65, 0x83, 0x58, 0x83, 0x67]);
    let message = assemble_message(raw.as_slice()).unwrap();
    assert_eq!(message.body_text(), Some("テスト"));
}

#[test]
fn test_truncated_base64_body() {
    let raw = "From: a@example.com\nContent-Transfer-Encoding: base64\n\nSGVsbG8sIFdvcmxkI";
    let message = assemble_message(raw.as_bytes()).unwrap();
    assert_eq!(message.body_text(), Some("Hello, World"));
}

#[test]
fn test_base64_body_in_padded_chunks() {
    let raw = "From: a@example.com\nContent-Transfer-Encoding: base64\n\nSGk=\r\nSGk=\r\n";
    let message = assemble_message(raw.as_bytes()).unwrap();
    assert_eq!(message.body_text(), Some("HiHi"));
}

#[test]
fn test_corrupt_base64_body_is_an_error() {
    let raw = "From: a@example.com\nContent-Transfer-Encoding: base64\n\nSG!Vs#bG8sIF=dvcmxk\n";
    assert!(matches!(assemble_message(raw.as_bytes()), Err(Error::Base64Decode(_))));
}

#[test]
fn test_quoted_printable_keeps_stray_equals() {
    let raw = "From: a@example.com\nContent-Transfer-Encoding: quoted-printable\n\n\
               price 5=ZZ, see https://x.example/?a=3Db&c=d\n";
    let message = assemble_message(raw.as_bytes()).unwrap();
    assert_eq!(
        message.body_text(),
        Some("price 5=ZZ, see https://x.example/?a=b&c=d\n")
    );
}

#[test]
fn test_read_then_decode_body() {
    let raw = read_message(ISO2022JP_QP.as_bytes()).unwrap();
    assert_eq!(
        raw.headers.get("content-transfer-encoding"),
        Some("quoted-printable")
    );

    let part = decode_body(&raw.headers, raw.body.as_slice()).unwrap();
    assert_eq!(part.text(), Some(SENTENCE));
    assert_eq!(part.charset, "ISO-2022-JP");
}

#[test]
fn test_decode_body_default_headers() {
    let part = decode_body(&Headers::new(), &b"plain ascii\n"[..]).unwrap();
    assert_eq!(part.text(), Some("plain ascii\n"));
    assert_eq!(part.charset, "us-ascii");

    let err = decode_body(&Headers::new(), &b"caf\xc3\xa9"[..]).unwrap_err();
    assert!(matches!(err, Error::InvalidCharsetData(_)));
}

#[test]
fn test_decode_header_values() {
    assert_eq!(
        decode_header("=?ISO-2022-JP?B?GyRCIVolRiU5JUg0RDYtIVslNSUkJUg5OT83JCw0ME47JDckXiQ3JD8bKEI=?=")
            .unwrap(),
        SUBJECT
    );
    assert_eq!(
        decode_header("=?UTF-8?B?44K044O8?= =?UTF-8?B?44OV44Kh44O8?=").unwrap(),
        "ゴーファー"
    );
    assert_eq!(decode_header("Gophers at Gophercon").unwrap(), "Gophers at Gophercon");
}

#[test]
fn test_charset_names_round_trip() {
    for name in ["ISO-2022-JP", "iso-2022-jp", "Shift_JIS", "shift_jis", "CP932", "EUC-JP", "UTF-8"] {
        let charset = Charset::resolve(name).unwrap();
        let encoding = encoding_rs::Encoding::for_label(charset.name().as_bytes()).unwrap();
        let (bytes, _, unmappable) = encoding.encode(SENTENCE);
        assert!(!unmappable);
        assert_eq!(charset.decode(&bytes).unwrap(), SENTENCE);
    }
}
